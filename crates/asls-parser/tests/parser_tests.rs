//! Integration tests for the tokenizer and parser.

use asls_core::{Diagnostics, HighlightKind, Highlights};
use asls_parser::ast::*;
use asls_parser::{tokenize, Parser, Token};
use bumpalo::Bump;

fn parse_with<'a>(
    source: &'a str,
    arena: &'a Bump,
    diagnostics: &mut Diagnostics,
) -> (&'a [Token<'a>], Script<'a>, Highlights) {
    // Tokens move into the arena so the script can borrow them.
    let tokens = tokenize(source, diagnostics);
    let tokens = arena.alloc_slice_copy(&tokens);
    let (script, highlights) = Parser::parse(tokens, arena, diagnostics);
    (tokens, script, highlights)
}

fn parse_clean<'a>(source: &'a str, arena: &'a Bump) -> (&'a [Token<'a>], Script<'a>, Highlights) {
    let mut diagnostics = Diagnostics::new("test.as");
    let result = parse_with(source, arena, &mut diagnostics);
    assert!(
        diagnostics.is_empty(),
        "unexpected diagnostics:\n{}",
        diagnostics
    );
    result
}

#[test]
fn parse_simple_function() {
    let arena = Bump::new();
    let (_, script, _) = parse_clean("void foo() { }", &arena);

    assert_eq!(script.items().len(), 1);
    match &script.items()[0] {
        Item::Func(func) => {
            assert_eq!(func.name.name, "foo");
            assert!(func.return_type().is_some_and(|t| t.is_void()));
            assert!(func.params.is_empty());
            assert!(func.body.statements.is_empty());
        }
        other => panic!("expected function, got {:?}", other),
    }
}

#[test]
fn parse_class_with_members() {
    let arena = Bump::new();
    let (_, script, _) = parse_clean(
        r#"
        class Player {
            int health;
            void takeDamage(int amount) {
                health -= amount;
            }
        }
        "#,
        &arena,
    );

    match &script.items()[0] {
        Item::Class(class) => {
            assert_eq!(class.name.name, "Player");
            assert_eq!(class.members.len(), 2);
            assert!(matches!(class.members[0], ClassMember::Var(_)));
            assert!(matches!(class.members[1], ClassMember::Func(_)));
        }
        other => panic!("expected class, got {:?}", other),
    }
}

#[test]
fn class_scope_range_is_inside_node_range() {
    let arena = Bump::new();
    let (_, script, _) = parse_clean("shared class A : B, C { int x; }", &arena);

    match &script.items()[0] {
        Item::Class(class) => {
            assert!(class.attrs.is_shared);
            assert_eq!(class.bases.len(), 2);
            assert!(class.range.start < class.scope_range.start);
            assert_eq!(class.range.end, class.scope_range.end);
            assert!(class.scope_range.contains(class.members[0].range().start));
        }
        other => panic!("expected class, got {:?}", other),
    }
}

#[test]
fn parse_constructor_and_destructor() {
    let arena = Bump::new();
    let (_, script, _) = parse_clean(
        r#"
        class A {
            A(int x) { }
            ~A() { }
        }
        "#,
        &arena,
    );

    match &script.items()[0] {
        Item::Class(class) => {
            let funcs: Vec<_> = class
                .members
                .iter()
                .filter_map(|m| match m {
                    ClassMember::Func(f) => Some(*f),
                    _ => None,
                })
                .collect();
            assert!(funcs[0].is_constructor());
            assert_eq!(funcs[0].params.len(), 1);
            assert!(funcs[1].is_destructor());
        }
        other => panic!("expected class, got {:?}", other),
    }
}

#[test]
fn constructor_arg_var_is_not_a_function() {
    // `A a(42);` shares its prefix with a constructor declaration.
    let arena = Bump::new();
    let (_, script, _) = parse_clean("class A { A(int x) {} } A a(42);", &arena);

    assert_eq!(script.items().len(), 2);
    match &script.items()[1] {
        Item::Var(var) => {
            assert_eq!(var.declarators.len(), 1);
            assert_eq!(var.declarators[0].name.name, "a");
            assert!(matches!(var.declarators[0].init, Some(VarInit::Args(_))));
        }
        other => panic!("expected variable, got {:?}", other),
    }
}

#[test]
fn parse_enum_with_values_and_trailing_comma() {
    let arena = Bump::new();
    let (_, script, _) = parse_clean("enum E { X, Y = 5, Z, }", &arena);

    match &script.items()[0] {
        Item::Enum(decl) => {
            assert_eq!(decl.name.name, "E");
            let names: Vec<_> = decl.members.iter().map(|m| m.name.name).collect();
            assert_eq!(names, ["X", "Y", "Z"]);
            assert!(decl.members[0].value.is_none());
            assert!(decl.members[1].value.is_some());
            assert!(decl.members[2].value.is_none());
        }
        other => panic!("expected enum, got {:?}", other),
    }
}

#[test]
fn parse_interface_members() {
    let arena = Bump::new();
    let (_, script, _) = parse_clean(
        r#"
        interface IDrawable {
            void draw(int layer);
            int Priority { get const; }
        }
        "#,
        &arena,
    );

    match &script.items()[0] {
        Item::Interface(decl) => {
            assert_eq!(decl.members.len(), 2);
            assert!(matches!(decl.members[0], InterfaceMember::Method(m) if m.name.name == "draw"));
            assert!(matches!(
                decl.members[1],
                InterfaceMember::VirtualProp(p) if p.accessors[0].kind == AccessorKind::Get
            ));
        }
        other => panic!("expected interface, got {:?}", other),
    }
}

#[test]
fn parse_namespace_path_and_nesting() {
    let arena = Bump::new();
    let (_, script, _) = parse_clean("namespace A::B { class Inner {} }", &arena);

    match &script.items()[0] {
        Item::Namespace(ns) => {
            let path: Vec<_> = ns.path.iter().map(|p| p.name).collect();
            assert_eq!(path, ["A", "B"]);
            assert!(matches!(ns.items[0], Item::Class(_)));
        }
        other => panic!("expected namespace, got {:?}", other),
    }
}

#[test]
fn parse_typedef_funcdef_import_mixin() {
    let arena = Bump::new();
    let (_, script, _) = parse_clean(
        r#"
        typedef int EntityId;
        funcdef void Callback(int x);
        import void log(const string &in msg) from "core";
        mixin class Shaky { void shake() {} }
        "#,
        &arena,
    );

    assert_eq!(script.items().len(), 4);
    assert!(matches!(script.items()[0], Item::TypeDef(t) if t.name.name == "EntityId"));
    assert!(matches!(script.items()[1], Item::FuncDef(f) if f.name.name == "Callback"));
    assert!(
        matches!(script.items()[2], Item::Import(i) if i.from_module.name == "\"core\"")
    );
    assert!(matches!(script.items()[3], Item::Mixin(m) if m.class.name.name == "Shaky"));
}

#[test]
fn parse_virtual_property_with_accessors() {
    let arena = Bump::new();
    let (_, script, _) = parse_clean(
        r#"
        class A {
            private int health;
            int Health {
                get const { return health; }
                set { health = value; }
            }
        }
        "#,
        &arena,
    );

    match &script.items()[0] {
        Item::Class(class) => match class.members[1] {
            ClassMember::VirtualProp(prop) => {
                assert_eq!(prop.name.name, "Health");
                assert_eq!(prop.accessors.len(), 2);
                assert!(prop.accessors[0].is_const);
                assert!(prop.accessors[0].body.is_some());
            }
            other => panic!("expected virtual property, got {:?}", other),
        },
        other => panic!("expected class, got {:?}", other),
    }
}

#[test]
fn expression_list_stays_flat() {
    // `1 + 2 * 3` parses as term (+ term (* term)) with no
    // precedence applied; the analyzer owns that.
    let arena = Bump::new();
    let (_, script, _) = parse_clean("int x = 1 + 2 * 3;", &arena);

    let init = match &script.items()[0] {
        Item::Var(var) => match var.declarators[0].init {
            Some(VarInit::Assign(assign)) => assign,
            other => panic!("expected assign init, got {:?}", other),
        },
        other => panic!("expected var, got {:?}", other),
    };

    let expr = init.condition.expr;
    let first = expr.tail.expect("first operator");
    assert_eq!(first.op.op, ExprOp::Add);
    let second = first.rhs.tail.expect("second operator");
    assert_eq!(second.op.op, ExprOp::Mul);
    assert!(second.rhs.tail.is_none());
}

#[test]
fn virtual_right_angle_operators() {
    let arena = Bump::new();
    let (_, script, _) = parse_clean("int a = x >> 2; int b = y >>> 3; bool c = i >= j;", &arena);

    let ops: Vec<ExprOp> = script
        .items()
        .iter()
        .map(|item| match item {
            Item::Var(var) => match var.declarators[0].init {
                Some(VarInit::Assign(assign)) => {
                    assign.condition.expr.tail.expect("operator").op.op
                }
                _ => panic!("expected assign init"),
            },
            _ => panic!("expected var"),
        })
        .collect();
    assert_eq!(ops, [ExprOp::Shr, ExprOp::ShrU, ExprOp::Ge]);
}

#[test]
fn shift_assign_and_not_is_synthesis() {
    let arena = Bump::new();
    let (_, script, _) = parse_clean("void f() { x >>>= 1; bool b = a !is null; }", &arena);

    let body = match &script.items()[0] {
        Item::Func(func) => func.body,
        other => panic!("expected func, got {:?}", other),
    };

    match &body.statements[0] {
        Statement::Expr(stat) => {
            let assign = stat.expr.expect("expression");
            assert_eq!(assign.tail.expect("assign tail").op.op, AssignOp::ShrUAssign);
        }
        other => panic!("expected expression statement, got {:?}", other),
    }
    match &body.statements[1] {
        Statement::Var(var) => match var.declarators[0].init {
            Some(VarInit::Assign(assign)) => {
                assert_eq!(assign.condition.expr.tail.expect("tail").op.op, ExprOp::NotIs);
            }
            _ => panic!("expected assign init"),
        },
        other => panic!("expected var statement, got {:?}", other),
    }
}

#[test]
fn spaced_right_angles_do_not_fuse() {
    let arena = Bump::new();
    let mut diagnostics = Diagnostics::new("test.as");
    // `> >` with a space is not a shift; the dangling `>` is an error.
    let (_, _, _) = parse_with("int a = x > > 2;", &arena, &mut diagnostics);
    assert!(!diagnostics.is_empty());
}

#[test]
fn nested_template_types_close_with_single_angles() {
    let arena = Bump::new();
    let (_, script, _) = parse_clean("array<array<int>> grid;", &arena);

    match &script.items()[0] {
        Item::Var(var) => {
            let ty = var.ty;
            assert_eq!(ty.datatype.ident.name, "array");
            assert_eq!(ty.template_args.len(), 1);
            let inner = ty.template_args[0];
            assert_eq!(inner.datatype.ident.name, "array");
            assert_eq!(inner.template_args.len(), 1);
        }
        other => panic!("expected var, got {:?}", other),
    }
}

#[test]
fn template_comparison_ambiguity_prefers_expression() {
    let arena = Bump::new();
    let (_, script, _) = parse_clean("void f() { bool x = a < b && c > d; }", &arena);

    let body = match &script.items()[0] {
        Item::Func(func) => func.body,
        other => panic!("expected func, got {:?}", other),
    };
    match &body.statements[0] {
        Statement::Var(var) => {
            let assign = match var.declarators[0].init {
                Some(VarInit::Assign(assign)) => assign,
                _ => panic!("expected assign init"),
            };
            // a < b && c > d — four terms, three operators.
            let expr = assign.condition.expr;
            let mut ops = Vec::new();
            let mut cursor = Some(expr);
            while let Some(e) = cursor {
                if let Some(tail) = e.tail {
                    ops.push(tail.op.op);
                    cursor = Some(tail.rhs);
                } else {
                    cursor = None;
                }
            }
            assert_eq!(ops, [ExprOp::Lt, ExprOp::And, ExprOp::Gt]);
        }
        other => panic!("expected var statement, got {:?}", other),
    }
}

#[test]
fn scoped_access_and_calls() {
    let arena = Bump::new();
    let (_, script, _) = parse_clean("void f() { Game::Audio::play(); int x = ::counter; }", &arena);

    let body = match &script.items()[0] {
        Item::Func(func) => func.body,
        other => panic!("expected func, got {:?}", other),
    };

    match &body.statements[0] {
        Statement::Expr(stat) => {
            let assign = stat.expr.expect("expression");
            let term = match assign.condition.expr.head {
                ExprTerm::Value(term) => term,
                other => panic!("expected value term, got {:?}", other),
            };
            match term.value {
                ExprValue::FuncCall(call) => {
                    let scope = call.scope.expect("scope");
                    assert!(!scope.is_global);
                    let path: Vec<_> = scope.path.iter().map(|p| p.name).collect();
                    assert_eq!(path, ["Game", "Audio"]);
                    assert_eq!(call.name.name, "play");
                }
                other => panic!("expected call, got {:?}", other),
            }
        }
        other => panic!("expected expression statement, got {:?}", other),
    }

    match &body.statements[1] {
        Statement::Var(var) => match var.declarators[0].init {
            Some(VarInit::Assign(assign)) => {
                let term = match assign.condition.expr.head {
                    ExprTerm::Value(term) => term,
                    other => panic!("expected value term, got {:?}", other),
                };
                match term.value {
                    ExprValue::VarAccess(access) => {
                        assert!(access.scope.expect("scope").is_global);
                        assert_eq!(access.name.name, "counter");
                    }
                    other => panic!("expected var access, got {:?}", other),
                }
            }
            _ => panic!("expected assign init"),
        },
        other => panic!("expected var statement, got {:?}", other),
    }
}

#[test]
fn postfix_chain() {
    let arena = Bump::new();
    let (_, script, _) = parse_clean("void f() { obj.items[0].update(1, 2)++; }", &arena);

    let body = match &script.items()[0] {
        Item::Func(func) => func.body,
        other => panic!("expected func, got {:?}", other),
    };
    let term = match &body.statements[0] {
        Statement::Expr(stat) => match stat.expr.expect("expr").condition.expr.head {
            ExprTerm::Value(term) => term,
            other => panic!("expected value term, got {:?}", other),
        },
        other => panic!("expected expression statement, got {:?}", other),
    };

    assert_eq!(term.post_ops.len(), 4);
    assert!(matches!(term.post_ops[0], PostOp::Field { name } if name.name == "items"));
    assert!(matches!(term.post_ops[1], PostOp::Index { .. }));
    assert!(
        matches!(term.post_ops[2], PostOp::MethodCall { name, args } if name.name == "update" && args.args.len() == 2)
    );
    assert!(matches!(
        term.post_ops[3],
        PostOp::IncDec {
            op: IncDecOp::Increment,
            ..
        }
    ));
}

#[test]
fn ternary_requires_both_branches() {
    let arena = Bump::new();
    let (_, script, _) = parse_clean("int x = flag ? 1 : 2;", &arena);
    match &script.items()[0] {
        Item::Var(var) => match var.declarators[0].init {
            Some(VarInit::Assign(assign)) => {
                assert!(assign.condition.ternary.is_some());
            }
            _ => panic!("expected assign init"),
        },
        other => panic!("expected var, got {:?}", other),
    }

    // Missing false branch: diagnostic, no ternary attached.
    let mut diagnostics = Diagnostics::new("test.as");
    let (_, script, _) = parse_with("int x = flag ? 1 :;", &arena, &mut diagnostics);
    assert!(!diagnostics.is_empty());
    match &script.items()[0] {
        Item::Var(_) => {}
        // Recovery may drop the declaration entirely; both are
        // acceptable as long as the diagnostic fired.
        _ => {}
    }
}

#[test]
fn lambda_with_lookahead() {
    let arena = Bump::new();
    let (_, script, _) = parse_clean("void f() { callback = function(int a, b) { return; }; }", &arena);

    let body = match &script.items()[0] {
        Item::Func(func) => func.body,
        other => panic!("expected func, got {:?}", other),
    };
    let assign = match &body.statements[0] {
        Statement::Expr(stat) => stat.expr.expect("expr"),
        other => panic!("expected expression statement, got {:?}", other),
    };
    let term = match assign.tail.expect("assignment").rhs.condition.expr.head {
        ExprTerm::Value(term) => term,
        other => panic!("expected value term, got {:?}", other),
    };
    match term.value {
        ExprValue::Lambda(lambda) => {
            assert_eq!(lambda.params.len(), 2);
            assert!(lambda.params[0].ty.is_some());
            assert!(lambda.params[1].ty.is_none());
            assert_eq!(lambda.params[1].name.unwrap().name, "b");
        }
        other => panic!("expected lambda, got {:?}", other),
    }
}

#[test]
fn function_without_lambda_shape_is_not_a_lambda() {
    // `function` followed by a call-less shape must not commit to the
    // lambda grammar.
    let arena = Bump::new();
    let mut diagnostics = Diagnostics::new("test.as");
    let (_, _, _) = parse_with("void f() { x = function + 1; }", &arena, &mut diagnostics);
    // 'function' cannot start a value here; errors are expected but
    // parsing must terminate.
    assert!(!diagnostics.is_empty());
}

#[test]
fn init_list_terms() {
    let arena = Bump::new();
    let (_, script, _) = parse_clean("void f() { data = int[] = {1, 2, {3, 4}}; }", &arena);

    let body = match &script.items()[0] {
        Item::Func(func) => func.body,
        other => panic!("expected func, got {:?}", other),
    };
    let assign = match &body.statements[0] {
        Statement::Expr(stat) => stat.expr.expect("expr"),
        other => panic!("expected expression statement, got {:?}", other),
    };
    match assign.tail.expect("assignment").rhs.condition.expr.head {
        ExprTerm::InitList { ty, list, .. } => {
            assert!(ty.is_some_and(|t| t.is_array));
            assert_eq!(list.elements.len(), 3);
            assert!(matches!(list.elements[2], InitElement::List(_)));
        }
        other => panic!("expected init list term, got {:?}", other),
    }
}

#[test]
fn metadata_blocks_are_decorators() {
    let arena = Bump::new();
    let (tokens, script, highlights) = parse_clean("[editable] [range(0, 10)] int speed;", &arena);

    match &script.items()[0] {
        Item::Var(var) => {
            assert_eq!(var.metadata.len(), 2);
            let block = var.metadata[1];
            for raw in block.start.0..=block.end.0 {
                assert_eq!(
                    highlights.get(asls_core::TokenId(raw)),
                    Some(HighlightKind::Decorator),
                    "token {:?} should be a decorator",
                    tokens[raw as usize]
                );
            }
        }
        other => panic!("expected var, got {:?}", other),
    }
}

#[test]
fn switch_cases_absorb_statements() {
    let arena = Bump::new();
    let (_, script, _) = parse_clean(
        r#"
        void f(int v) {
            switch (v) {
                case 1:
                    go();
                    break;
                case 2:
                default:
                    break;
            }
        }
        "#,
        &arena,
    );

    let body = match &script.items()[0] {
        Item::Func(func) => func.body,
        other => panic!("expected func, got {:?}", other),
    };
    match &body.statements[0] {
        Statement::Switch(switch) => {
            assert_eq!(switch.cases.len(), 3);
            assert_eq!(switch.cases[0].statements.len(), 2);
            assert!(switch.cases[1].statements.is_empty());
            assert!(switch.cases[1].label.is_some());
            assert!(switch.cases[2].label.is_none());
        }
        other => panic!("expected switch, got {:?}", other),
    }
}

#[test]
fn control_flow_statements() {
    let arena = Bump::new();
    let (_, script, _) = parse_clean(
        r#"
        void f() {
            for (int i = 0; i < 10; i++, j--) { }
            while (running) { continue; }
            do { } while (again);
            try { risky(); } catch { }
            if (done) { return; } else { return 1; }
        }
        "#,
        &arena,
    );

    let body = match &script.items()[0] {
        Item::Func(func) => func.body,
        other => panic!("expected func, got {:?}", other),
    };
    assert_eq!(body.statements.len(), 5);
    match &body.statements[0] {
        Statement::For(for_stat) => {
            assert!(matches!(for_stat.init, Some(ForInit::Var(_))));
            assert!(for_stat.condition.is_some());
            assert_eq!(for_stat.increments.len(), 2);
        }
        other => panic!("expected for, got {:?}", other),
    }
    assert!(matches!(body.statements[1], Statement::While(_)));
    assert!(matches!(body.statements[2], Statement::DoWhile(_)));
    assert!(matches!(
        body.statements[3],
        Statement::Try(t) if t.catch_block.is_some()
    ));
    assert!(matches!(body.statements[4], Statement::If(_)));
}

// ============================================================================
// Resilience
// ============================================================================

#[test]
fn class_member_recovery() {
    let arena = Bump::new();
    let mut diagnostics = Diagnostics::new("test.as");
    let (_, script, _) = parse_with("class C { int ; } int after;", &arena, &mut diagnostics);

    assert!(diagnostics.any_contains("Expected class member."));
    // The class node survives and parsing continues past it.
    assert_eq!(script.items().len(), 2);
    assert!(matches!(script.items()[0], Item::Class(c) if c.name.name == "C"));
    assert!(matches!(script.items()[1], Item::Var(_)));
}

#[test]
fn parser_terminates_on_garbage() {
    let arena = Bump::new();
    let mut diagnostics = Diagnostics::new("test.as");
    let (_, _, _) = parse_with("$ $$ ) } ] ;;; class ( @@", &arena, &mut diagnostics);
    assert!(!diagnostics.is_empty());
}

#[test]
fn unterminated_block_recovers() {
    let arena = Bump::new();
    let mut diagnostics = Diagnostics::new("test.as");
    let (_, script, _) = parse_with("void f() { int x = 1;", &arena, &mut diagnostics);

    assert!(!diagnostics.is_empty());
    assert_eq!(script.items().len(), 1);
    match &script.items()[0] {
        Item::Func(func) => assert_eq!(func.body.statements.len(), 1),
        other => panic!("expected func, got {:?}", other),
    }
}

#[test]
fn every_token_is_classified_on_clean_input() {
    let arena = Bump::new();
    let source = r#"
        // comment survives as a classified token
        class A : B {
            private int x = 0xFF;
            void m(float f = 1.5) const override { x++; }
        }
        enum E { A, B = 2 }
        void main() {
            A a;
            a.m(3.5f);
            int[] xs = {1, 2};
        }
    "#;
    let (tokens, _, highlights) = parse_clean(source, &arena);

    for (i, token) in tokens.iter().enumerate() {
        if token.is_end() {
            continue;
        }
        assert!(
            highlights.get(asls_core::TokenId(i as u32)).is_some(),
            "token {:?} was never classified",
            token
        );
    }
}

#[test]
fn node_ranges_nest_and_do_not_overlap() {
    let arena = Bump::new();
    let (_, script, _) = parse_clean(
        "int a = 1; class B { void m() {} } void c() { a = 2; }",
        &arena,
    );

    let ranges: Vec<_> = script
        .items()
        .iter()
        .map(|item| match item {
            Item::Var(v) => v.range,
            Item::Class(c) => c.range,
            Item::Func(f) => f.range,
            other => panic!("unexpected item {:?}", other),
        })
        .collect();

    for pair in ranges.windows(2) {
        assert!(
            pair[0].end < pair[1].start,
            "sibling ranges overlap: {:?} vs {:?}",
            pair[0],
            pair[1]
        );
    }
    for range in ranges {
        assert!(range.start <= range.end);
    }
}

#[test]
fn func_with_semicolon_body_keeps_empty_block() {
    let arena = Bump::new();
    let (_, script, _) = parse_clean("class A { void later(); }", &arena);

    match &script.items()[0] {
        Item::Class(class) => match class.members[0] {
            ClassMember::Func(func) => {
                assert!(func.body.statements.is_empty());
                assert!(func.range.contains(func.body.range.start));
            }
            other => panic!("expected method, got {:?}", other),
        },
        other => panic!("expected class, got {:?}", other),
    }
}
