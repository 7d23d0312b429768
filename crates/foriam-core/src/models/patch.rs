//! Per-field presence wrapper for partial updates.
//!
//! Store adapters translate every field of an update struct into the
//! same parameterized statement regardless of which fields are set;
//! `Unchanged` binds `NONE`, which the statement reads as "keep the
//! current value".

/// A single field of a partial update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Patch<T> {
    Unchanged,
    Set(T),
}

impl<T> Patch<T> {
    pub fn is_set(&self) -> bool {
        matches!(self, Patch::Set(_))
    }

    pub fn as_ref(&self) -> Patch<&T> {
        match self {
            Patch::Unchanged => Patch::Unchanged,
            Patch::Set(v) => Patch::Set(v),
        }
    }

    /// `Some` for `Set`, `None` for `Unchanged`. This is the value a
    /// store adapter binds.
    pub fn into_option(self) -> Option<T> {
        match self {
            Patch::Unchanged => None,
            Patch::Set(v) => Some(v),
        }
    }
}

impl<T> Default for Patch<T> {
    fn default() -> Self {
        Patch::Unchanged
    }
}

impl<T> From<Option<T>> for Patch<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Patch::Set(v),
            None => Patch::Unchanged,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_unchanged() {
        let p: Patch<String> = Patch::default();
        assert!(!p.is_set());
        assert_eq!(p.into_option(), None);
    }

    #[test]
    fn set_false_is_still_set() {
        let p = Patch::Set(false);
        assert!(p.is_set());
        assert_eq!(p.into_option(), Some(false));
    }

    #[test]
    fn from_option() {
        assert_eq!(Patch::from(Some(3)), Patch::Set(3));
        assert_eq!(Patch::<i32>::from(None), Patch::Unchanged);
    }
}
