//! End-to-end analysis scenarios.

use asls_analyzer::completion::CompletionHint;
use asls_analyzer::symbols::{SymbolArena, SymbolId};
use asls_analyzer::{analyze, Analysis};
use asls_core::HighlightKind;
use bumpalo::Bump;

fn run<'a>(source: &'a str, arena: &'a Bump) -> Analysis<'a> {
    analyze("test.as", source, arena)
}

fn assert_clean(analysis: &Analysis<'_>) {
    assert!(
        analysis.diagnostics.is_empty(),
        "unexpected diagnostics:\n{}",
        analysis.diagnostics
    );
}

fn global_var_type<'a>(analysis: &'a Analysis<'_>, name: &str) -> &'a str {
    let symbols = &analysis.symbols;
    let id = symbols
        .lookup(symbols.global(), name)
        .unwrap_or_else(|| panic!("variable '{}' missing", name));
    let ty = symbols
        .symbol(id)
        .as_variable()
        .unwrap_or_else(|| panic!("'{}' is not a variable", name))
        .ty
        .as_ref()
        .unwrap_or_else(|| panic!("variable '{}' has no type", name));
    symbols.symbol(ty.symbol).name()
}

fn all_references(symbols: &SymbolArena<'_>) -> Vec<(asls_core::TokenId, SymbolId)> {
    let mut out = Vec::new();
    let mut pending = vec![symbols.global()];
    while let Some(scope) = pending.pop() {
        for reference in &symbols.scope(scope).referenced {
            out.push((reference.token, reference.symbol));
        }
        pending.extend(symbols.scope(scope).children.iter().copied());
    }
    out
}

fn all_hints<'s, 'a>(symbols: &'s SymbolArena<'a>) -> Vec<&'s CompletionHint> {
    let mut out = Vec::new();
    let mut pending = vec![symbols.global()];
    while let Some(scope) = pending.pop() {
        out.extend(symbols.scope(scope).hints.iter());
        pending.extend(symbols.scope(scope).children.iter().copied());
    }
    out
}

// ============================================================================
// Core scenarios
// ============================================================================

#[test]
fn s1_arithmetic_initializer() {
    let arena = Bump::new();
    let analysis = run("int x = 1 + 2 * 3;", &arena);
    assert_clean(&analysis);
    assert_eq!(global_var_type(&analysis, "x"), "int");
}

#[test]
fn s2_class_constructor_and_instance() {
    let arena = Bump::new();
    let analysis = run("class A { int v; A(int x) { v = x; } } A a(42);", &arena);
    assert_clean(&analysis);

    let symbols = &analysis.symbols;
    let class = symbols.lookup(symbols.global(), "A").expect("class A");
    let class_ty = symbols.symbol(class).as_type().expect("a type");
    let members = class_ty.members_scope.expect("member scope");

    let field = symbols.lookup(members, "v").expect("field v");
    let field_ty = symbols.symbol(field).as_variable().unwrap();
    assert!(field_ty.is_instance_member);
    assert_eq!(
        symbols.symbol(field_ty.ty.as_ref().unwrap().symbol).name(),
        "int"
    );

    let constructor = symbols.lookup(members, "A").expect("constructor");
    assert_eq!(symbols.overload_chain(constructor).len(), 1);
    assert_eq!(global_var_type(&analysis, "a"), "A");
}

#[test]
fn s3_type_mismatch_location() {
    let arena = Bump::new();
    let analysis = run("int a = 1; bool b = a;", &arena);

    assert!(analysis.diagnostics.any_contains("Type mismatch"));
    let mismatch = analysis
        .diagnostics
        .iter()
        .find(|d| d.message.contains("Type mismatch"))
        .unwrap();
    // Covers the right-hand `a`, the last token before the ';'.
    let rhs_col = "int a = 1; bool b = ".len() as u32 + 1;
    assert_eq!(mismatch.span.line, 1);
    assert_eq!(mismatch.span.col, rhs_col);

    // The variable is still inserted with its declared type.
    assert_eq!(global_var_type(&analysis, "b"), "bool");
}

#[test]
fn s4_enum_members_and_enum_constructor() {
    let arena = Bump::new();
    let analysis = run("enum E { X, Y = 5, Z, } E e = E(1);", &arena);
    assert_clean(&analysis);

    let symbols = &analysis.symbols;
    let enum_id = symbols.lookup(symbols.global(), "E").expect("enum E");
    let members = symbols
        .symbol(enum_id)
        .as_type()
        .unwrap()
        .members_scope
        .expect("enum scope");
    for name in ["X", "Y", "Z"] {
        let member = symbols.lookup(members, name).expect(name);
        let ty = symbols.symbol(member).as_variable().unwrap().ty.as_ref().unwrap();
        assert_eq!(ty.symbol, enum_id);
    }
    assert_eq!(global_var_type(&analysis, "e"), "E");
}

#[test]
fn s4_enum_constructor_requires_integer() {
    let arena = Bump::new();
    let analysis = run(r#"enum E { X } class C {} void f() { C c; E e = E(c); }"#, &arena);
    assert!(analysis
        .diagnostics
        .any_contains("Enum constructor requires an integer"));
}

#[test]
fn s5_overload_resolution_and_reference() {
    let arena = Bump::new();
    let analysis = run(
        "int f(int x) { return x; }\nint f(float x) { return 0; }\nvoid g() {\n    f(1);\n}\n",
        &arena,
    );
    assert_clean(&analysis);

    let symbols = &analysis.symbols;
    let first = symbols.lookup(symbols.global(), "f").expect("f");
    let chain = symbols.overload_chain(first);
    assert_eq!(chain.len(), 2, "two overloads linked");

    // The call resolves to the int overload — the first in the chain —
    // and the call site's identifier is recorded against it.
    let call_reference = all_references(symbols)
        .into_iter()
        .filter(|(token, _)| {
            let token = &analysis.tokens[token.index()];
            token.text == "f" && token.span.line == 4
        })
        .collect::<Vec<_>>();
    assert_eq!(call_reference.len(), 1);
    assert_eq!(call_reference[0].1, chain[0]);
}

#[test]
fn s5_overload_is_deterministic() {
    let source = "int f(int x) { return x; }\nint f(float x) { return 0; }\nvoid g() {\n    f(1);\n}\n";
    let mut chosen = Vec::new();
    for _ in 0..3 {
        let arena = Bump::new();
        let analysis = run(source, &arena);
        let symbols = &analysis.symbols;
        let reference = all_references(symbols)
            .into_iter()
            .find(|(token, _)| analysis.tokens[token.index()].span.line == 4)
            .expect("call reference");
        // Stable across runs: always the chain head (the int overload).
        let first = symbols.lookup(symbols.global(), "f").unwrap();
        chosen.push(reference.1 == symbols.overload_chain(first)[0]);
    }
    assert!(chosen.iter().all(|&c| c));
}

// ============================================================================
// Operators
// ============================================================================

#[test]
fn precedence_orders_comparison_after_arithmetic() {
    let arena = Bump::new();
    // (1 + 2 * 3) < 10 type-checks to bool only if the analyzer
    // applies the precedence table.
    let analysis = run("bool ok = 1 + 2 * 3 < 10;", &arena);
    assert_clean(&analysis);
    assert_eq!(global_var_type(&analysis, "ok"), "bool");
}

#[test]
fn precedence_relational_binds_tighter_than_equality() {
    let arena = Bump::new();
    let analysis = run("bool ok = 1 < 2 == true;", &arena);
    assert_clean(&analysis);
}

#[test]
fn numeric_common_type_widens() {
    let arena = Bump::new();
    let analysis = run("double d = 1 + 2.5;", &arena);
    assert_clean(&analysis);

    let arena = Bump::new();
    let analysis = run("int i = 1 + 2.5;", &arena);
    // double result narrows implicitly; no diagnostic under the
    // permissive numeric lattice.
    assert_clean(&analysis);
    assert_eq!(global_var_type(&analysis, "i"), "int");
}

#[test]
fn operator_alias_rewrites_to_method() {
    let arena = Bump::new();
    let analysis = run(
        r#"
        class Vec {
            int x;
            Vec opAdd(Vec other) { Vec r; return r; }
        }
        void f() {
            Vec a, b;
            Vec c = a + b;
        }
        "#,
        &arena,
    );
    assert_clean(&analysis);
}

#[test]
fn reflected_alias_on_right_operand() {
    let arena = Bump::new();
    let analysis = run(
        r#"
        class Scale {
            int opMul_r(int k) { return k; }
        }
        void f() {
            Scale s;
            int r = 2 * s;
        }
        "#,
        &arena,
    );
    assert_clean(&analysis);
}

#[test]
fn missing_operator_alias_reports() {
    let arena = Bump::new();
    let analysis = run(
        r#"
        class Bare {}
        void f() {
            Bare a, b;
            a + b;
        }
        "#,
        &arena,
    );
    assert!(analysis.diagnostics.any_contains("Operator"));
    assert!(analysis.diagnostics.any_contains("is not defined"));
}

#[test]
fn equality_aliases_to_op_equals() {
    let arena = Bump::new();
    let analysis = run(
        r#"
        class Id {
            bool opEquals(Id other) { return true; }
        }
        void f() {
            Id a, b;
            bool same = a == b;
            bool ordered = a < b;
        }
        "#,
        &arena,
    );
    // opEquals exists, opCmp does not.
    assert!(analysis.diagnostics.any_contains("opCmp"));
    let count = analysis
        .diagnostics
        .iter()
        .filter(|d| d.message.contains("Operator"))
        .count();
    assert_eq!(count, 1);
}

#[test]
fn logic_operators_force_bool() {
    let arena = Bump::new();
    let analysis = run("void f() { int x = 1; int y = 2; bool b = x && y; }", &arena);
    assert!(analysis
        .diagnostics
        .any_contains("not convertible to bool"));

    let arena = Bump::new();
    let analysis = run("void f() { bool p = true, q = false; bool b = p or q; }", &arena);
    assert_clean(&analysis);
}

#[test]
fn compound_assignment_aliases() {
    let arena = Bump::new();
    let analysis = run(
        r#"
        class Acc {
            Acc opAddAssign(int v) { return this; }
        }
        void f() {
            Acc a;
            a += 3;
        }
        "#,
        &arena,
    );
    assert_clean(&analysis);
}

#[test]
fn handle_identity_is_bool() {
    let arena = Bump::new();
    let analysis = run(
        "class A {} void f() { A@ a; bool missing = a is null; bool there = a !is null; }",
        &arena,
    );
    assert_clean(&analysis);
}

// ============================================================================
// Scopes, templates, members
// ============================================================================

#[test]
fn namespace_scope_resolution() {
    let arena = Bump::new();
    let analysis = run(
        r#"
        namespace Game {
            class Player {}
        }
        Game::Player p;
        "#,
        &arena,
    );
    assert_clean(&analysis);
    assert_eq!(global_var_type(&analysis, "p"), "Player");
}

#[test]
fn global_scope_prefix_anchors_lookup() {
    let arena = Bump::new();
    let analysis = run(
        r#"
        int counter;
        namespace Inner {
            void f() {
                int x = ::counter;
            }
        }
        "#,
        &arena,
    );
    assert_clean(&analysis);
}

#[test]
fn invalid_scope_reports() {
    let arena = Bump::new();
    let analysis = run("Nowhere::Thing t;", &arena);
    assert!(analysis.diagnostics.any_contains("Invalid scope"));
}

#[test]
fn sibling_namespace_reachable_by_climbing() {
    let arena = Bump::new();
    let analysis = run(
        r#"
        namespace Audio { class Mixer {} }
        namespace Game {
            void f() {
                Audio::Mixer m;
            }
        }
        "#,
        &arena,
    );
    assert_clean(&analysis);
}

#[test]
fn template_field_translates_to_argument() {
    let arena = Bump::new();
    let analysis = run(
        r#"
        class Box<T> {
            T value;
        }
        void f() {
            Box<int> b;
            int inner = b.value;
        }
        "#,
        &arena,
    );
    assert_clean(&analysis);
}

#[test]
fn array_sugar_indexes_to_element_type() {
    let arena = Bump::new();
    let analysis = run("void f() { int[] xs = {1, 2}; int first = xs[0]; }", &arena);
    assert_clean(&analysis);
}

#[test]
fn auto_takes_initializer_type() {
    let arena = Bump::new();
    let analysis = run("auto d = 1.5; auto n = 7;", &arena);
    assert_clean(&analysis);
    assert_eq!(global_var_type(&analysis, "d"), "double");
    assert_eq!(global_var_type(&analysis, "n"), "int");
}

#[test]
fn private_member_access_is_checked() {
    let arena = Bump::new();
    let analysis = run(
        r#"
        class Safe {
            private int secret;
            int peek() { return secret; }
        }
        void f() {
            Safe s;
            int leaked = s.secret;
        }
        "#,
        &arena,
    );
    assert!(analysis.diagnostics.any_contains("is not public member"));
    // Exactly one: the in-class use is allowed.
    let count = analysis
        .diagnostics
        .iter()
        .filter(|d| d.message.contains("not public"))
        .count();
    assert_eq!(count, 1);
}

#[test]
fn method_calls_resolve_members() {
    let arena = Bump::new();
    let analysis = run(
        r#"
        class Counter {
            int total;
            void add(int amount) { total = total + amount; }
            int get() { return total; }
        }
        void f() {
            Counter c;
            c.add(5);
            int t = c.get();
        }
        "#,
        &arena,
    );
    assert_clean(&analysis);
}

#[test]
fn unknown_method_reports() {
    let arena = Bump::new();
    let analysis = run("class A {} void f() { A a; a.missing(); }", &arena);
    assert!(analysis.diagnostics.any_contains("'missing' is not defined"));
}

#[test]
fn indexer_rewrites_to_op_index() {
    let arena = Bump::new();
    let analysis = run(
        r#"
        class Grid {
            int opIndex(int x, int y) { return 0; }
        }
        void f() {
            Grid g;
            int cell = g[1, 2];
        }
        "#,
        &arena,
    );
    assert_clean(&analysis);
}

#[test]
fn funcdef_delegate_call() {
    let arena = Bump::new();
    let analysis = run(
        r#"
        funcdef int Op(int x);
        int apply(Op@ op) {
            return op(1);
        }
        "#,
        &arena,
    );
    assert_clean(&analysis);
}

#[test]
fn enum_member_access_through_scope() {
    let arena = Bump::new();
    let analysis = run("enum Color { Red, Green } Color c = Color::Red;", &arena);
    assert_clean(&analysis);
    assert_eq!(global_var_type(&analysis, "c"), "Color");
}

// ============================================================================
// Control flow
// ============================================================================

#[test]
fn non_bool_condition_reports() {
    let arena = Bump::new();
    let analysis = run("void f() { if (1) {} }", &arena);
    assert!(analysis
        .diagnostics
        .any_contains("Condition is not convertible to bool"));

    let arena = Bump::new();
    let analysis = run("void f() { bool b = true; while (b) {} do {} while (b); }", &arena);
    assert_clean(&analysis);
}

#[test]
fn void_function_cannot_return_value() {
    let arena = Bump::new();
    let analysis = run("void f() { return 1; }", &arena);
    assert!(analysis
        .diagnostics
        .any_contains("A void function cannot return a value"));
}

#[test]
fn return_type_is_checked() {
    let arena = Bump::new();
    let analysis = run("class A {} bool f() { A a; return a; }", &arena);
    assert!(analysis.diagnostics.any_contains("Type mismatch"));
}

#[test]
fn getter_returns_property_type() {
    let arena = Bump::new();
    let analysis = run(
        r#"
        class Player {
            private int health;
            int Health {
                get const { return health; }
                set { health = value; }
            }
        }
        "#,
        &arena,
    );
    assert_clean(&analysis);
}

#[test]
fn getter_type_mismatch_reports() {
    let arena = Bump::new();
    let analysis = run(
        r#"
        class Broken {
            bool Flag {
                get { Broken b; return b; }
            }
        }
        "#,
        &arena,
    );
    assert!(analysis.diagnostics.any_contains("Type mismatch"));
}

#[test]
fn bare_function_reference_reports() {
    let arena = Bump::new();
    let analysis = run("void g() {} void h() { g; }", &arena);
    assert!(analysis
        .diagnostics
        .any_contains("Function call without handler"));
}

#[test]
fn handle_of_function_is_quiet() {
    let arena = Bump::new();
    let analysis = run("void g() {} void h() { @g; }", &arena);
    assert!(!analysis
        .diagnostics
        .any_contains("Function call without handler"));
}

#[test]
fn loop_scopes_contain_declarations() {
    let arena = Bump::new();
    let analysis = run(
        r#"
        void f() {
            for (int i = 0; i < 3; i++) { int x = i; }
            for (int i = 0; i < 5; i++) { }
        }
        "#,
        &arena,
    );
    // Each for-loop introduces its own scope; the second `i` does not
    // clash with the first.
    assert_clean(&analysis);
}

#[test]
fn switch_cases_analyze_contents() {
    let arena = Bump::new();
    let analysis = run(
        r#"
        enum Mode { On, Off }
        void f(Mode m) {
            switch (m) {
                case Mode::On: { int x = 1; } break;
                default: break;
            }
        }
        "#,
        &arena,
    );
    assert_clean(&analysis);
}

// ============================================================================
// Hints, highlights, diagnostics plumbing
// ============================================================================

#[test]
fn namespace_hints_are_recorded() {
    let arena = Bump::new();
    let analysis = run(
        "namespace Game { class Player {} } Game::Player p;",
        &arena,
    );
    assert_clean(&analysis);
    let hints = all_hints(&analysis.symbols);
    assert!(hints
        .iter()
        .any(|h| matches!(h, CompletionHint::Namespace { path, .. } if path.len() == 1)));
    assert!(hints
        .iter()
        .any(|h| matches!(h, CompletionHint::Type { .. })));
}

#[test]
fn argument_hints_carry_passing_ranges() {
    let arena = Bump::new();
    let analysis = run("void f(int a, int b) {} void g() { f(1, 2); }", &arena);
    assert_clean(&analysis);
    let hints = all_hints(&analysis.symbols);
    let args = hints
        .iter()
        .find_map(|h| match h {
            CompletionHint::Arguments { passing_ranges, .. } => Some(passing_ranges),
            _ => None,
        })
        .expect("arguments hint");
    assert_eq!(args.len(), 2);
}

#[test]
fn analyzer_reclassifies_identifiers() {
    let arena = Bump::new();
    let analysis = run(
        "enum Color { Red }\nvoid f(int param) {\n    int x = param;\n    Color c = Color::Red;\n}\n",
        &arena,
    );
    assert_clean(&analysis);

    let token_kind = |text: &str, line: u32| {
        analysis
            .tokens
            .iter()
            .enumerate()
            .find(|(_, t)| t.text == text && t.span.line == line)
            .map(|(i, _)| analysis.highlights.get(asls_core::TokenId(i as u32)))
            .unwrap()
    };
    // Use sites, not declarations: the parser first classified the
    // read of `param` as a plain variable and `Red` as an identifier
    // path segment; the analyzer re-classifies both.
    assert_eq!(token_kind("param", 3), Some(HighlightKind::Parameter));
    assert_eq!(token_kind("Red", 4), Some(HighlightKind::EnumMember));
}

#[test]
fn undefined_name_reports_and_propagates_silently() {
    let arena = Bump::new();
    let analysis = run("void f() { int x = missing + 1; }", &arena);
    // One diagnostic for the unknown name; the binary operator guards
    // against the unknown operand instead of cascading.
    let count = analysis
        .diagnostics
        .iter()
        .filter(|d| d.message.contains("not defined"))
        .count();
    assert_eq!(count, 1);
    assert!(!analysis.diagnostics.any_contains("Operator"));
}

#[test]
fn duplicate_declaration_reports() {
    let arena = Bump::new();
    let analysis = run("int x; int x;", &arena);
    assert!(analysis.diagnostics.any_contains("already declared"));
}

#[test]
fn ambiguous_overload_reports() {
    let arena = Bump::new();
    let analysis = run(
        r#"
        void f(int a, float b) {}
        void f(float a, int b) {}
        void g() { f(1, 1); }
        "#,
        &arena,
    );
    assert!(analysis.diagnostics.any_contains("Ambiguous"));
}

#[test]
fn this_resolves_to_enclosing_class() {
    let arena = Bump::new();
    let analysis = run(
        r#"
        class Node {
            Node next() { return this; }
        }
        "#,
        &arena,
    );
    assert_clean(&analysis);
}

#[test]
fn constructor_type_lookup_retries_past_constructor() {
    // Inside the class, `A` must resolve to the type even though the
    // constructor function shadows the name in the member scope.
    let arena = Bump::new();
    let analysis = run(
        r#"
        class A {
            A(int x) {}
            A clone() {
                A copy(1);
                return copy;
            }
        }
        "#,
        &arena,
    );
    assert_clean(&analysis);
}
