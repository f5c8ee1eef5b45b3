//! Overload resolution.
//!
//! Given a call site and the head of an overload chain, every
//! candidate is scored by how its parameters receive the arguments
//! (exact match beats conversion); the best score wins, ties are
//! reported as ambiguous, and the chosen overload is recorded for
//! go-to-definition and argument hints.

use super::calls::CallSite;
use super::Analyzer;
use crate::completion::CompletionHint;
use crate::conversion::can_convert;
use crate::symbols::{FuncReturn, ResolvedType, SymbolId, TemplateTranslate};
use std::rc::Rc;

const SCORE_EXACT: u32 = 2;
const SCORE_CONVERTIBLE: u32 = 1;

impl<'a, 'out> Analyzer<'a, 'out> {
    /// Resolve a call against `first`'s overload chain.
    ///
    /// Returns the chosen overload's return type, translated through
    /// `translate`. For constructors the caller passes the
    /// `constructed` type, which becomes the call's result. Mismatch
    /// and ambiguity diagnostics are emitted here.
    pub(crate) fn check_function_match(
        &mut self,
        site: &CallSite<'a>,
        first: SymbolId,
        translate: Option<Rc<TemplateTranslate>>,
        constructed: Option<ResolvedType>,
    ) -> Option<ResolvedType> {
        let chain = self.symbols.overload_chain(first);

        let mut best: Option<(u32, SymbolId)> = None;
        let mut ambiguous = false;
        for candidate in chain {
            let Some(score) = self.score_overload(candidate, site, &translate) else {
                continue;
            };
            match best {
                None => best = Some((score, candidate)),
                Some((top, _)) if score > top => {
                    best = Some((score, candidate));
                    ambiguous = false;
                }
                Some((top, _)) if score == top => ambiguous = true,
                Some(_) => {}
            }
        }

        let Some((_, chosen)) = best else {
            self.error(
                site.span,
                format!("No matching signature for '{}'.", site.name),
            );
            return None;
        };
        if ambiguous {
            self.error(site.span, format!("Ambiguous call to '{}'.", site.name));
        }

        self.add_reference(site.name_token, chosen);
        self.add_hint(CompletionHint::Arguments {
            callee: chosen,
            passing_ranges: site.arg_spans.clone(),
            translate: translate.clone(),
        });

        if let Some(constructed) = constructed {
            return Some(constructed);
        }

        let function = self.symbols.symbol(chosen).as_function()?;
        let function_scope = function.scope;
        match function.return_decl() {
            FuncReturn::Type(node, _) => {
                let resolved =
                    self.quietly(|a| a.with_scope(function_scope, |a| a.analyze_type(node)));
                self.apply_translate(resolved, &translate)
            }
            FuncReturn::Nothing => self.builtin_type("void"),
            // Reached only when a constructor is called without a
            // constructed type, which dispatch never does.
            FuncReturn::Constructed => None,
        }
    }

    /// Score one candidate, or `None` when it cannot take the
    /// arguments. Signatures re-resolve quietly: their own problems
    /// were reported at the declaration.
    fn score_overload(
        &mut self,
        candidate: SymbolId,
        site: &CallSite<'a>,
        translate: &Option<Rc<TemplateTranslate>>,
    ) -> Option<u32> {
        let function = self.symbols.symbol(candidate).as_function()?;
        let function_scope = function.scope;
        let params = function.params();

        let required = params.iter().filter(|p| p.default.is_none()).count();
        if site.arg_types.len() > params.len() || site.arg_types.len() < required {
            return None;
        }

        let mut score = 0;
        for (arg, param) in site.arg_types.iter().zip(params) {
            let param_ty =
                self.quietly(|a| a.with_scope(function_scope, |a| a.analyze_type(param.ty)));
            let param_ty = self.apply_translate(param_ty, translate);

            score += match (arg, &param_ty) {
                (None, _) | (_, None) => SCORE_CONVERTIBLE,
                (Some(a), Some(p)) if a.symbol == p.symbol => SCORE_EXACT,
                _ if can_convert(&self.symbols, arg, &param_ty) => SCORE_CONVERTIBLE,
                _ => return None,
            };
        }
        Some(score)
    }
}
