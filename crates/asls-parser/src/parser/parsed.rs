//! Three-valued parse result.

/// The result of attempting one production.
///
/// - `Ok` — the production matched and produced a node.
/// - `Mismatch` — the first tokens did not match; the cursor has not
///   advanced and the caller is free to try an alternative.
/// - `Pending` — the production started but failed partway through.
///   The cursor sits past the consumed prefix and diagnostics were
///   already emitted; the caller must not try another alternative at
///   this position but may continue with the surrounding construct.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Parsed<T> {
    Ok(T),
    Mismatch,
    Pending,
}

impl<T> Parsed<T> {
    #[inline]
    pub fn is_mismatch(&self) -> bool {
        matches!(self, Parsed::Mismatch)
    }

    #[inline]
    pub fn is_pending(&self) -> bool {
        matches!(self, Parsed::Pending)
    }

    /// The node, if the production matched.
    #[inline]
    pub fn ok(self) -> Option<T> {
        match self {
            Parsed::Ok(value) => Some(value),
            _ => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Parsed<U> {
        match self {
            Parsed::Ok(value) => Parsed::Ok(f(value)),
            Parsed::Mismatch => Parsed::Mismatch,
            Parsed::Pending => Parsed::Pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors() {
        assert_eq!(Parsed::Ok(3).ok(), Some(3));
        assert_eq!(Parsed::<i32>::Mismatch.ok(), None);
        assert!(Parsed::<i32>::Mismatch.is_mismatch());
        assert!(Parsed::<i32>::Pending.is_pending());
        assert_eq!(Parsed::Ok(3).map(|v| v + 1), Parsed::Ok(4));
    }
}
