//! Result of a cache read that keeps "absent" apart from "present".

/// Outcome of reading a single key.
///
/// A `Miss` carries no value, so a stored `None` (or any other falsy
/// payload) is still reported as `Hit`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<T> {
    /// The key was present and not expired.
    Hit(T),
    /// The key was absent, expired or unreadable.
    Miss,
}

impl<T> Lookup<T> {
    /// Returns `true` for [`Lookup::Hit`].
    #[inline]
    pub fn is_hit(&self) -> bool {
        matches!(self, Lookup::Hit(_))
    }

    /// Returns `true` for [`Lookup::Miss`].
    #[inline]
    pub fn is_miss(&self) -> bool {
        !self.is_hit()
    }

    /// Drops the hit flag.
    ///
    /// This is lossy when `T` is itself an `Option`: a stored `None` and a
    /// miss both end up as `None`.
    #[inline]
    pub fn into_option(self) -> Option<T> {
        match self {
            Lookup::Hit(value) => Some(value),
            Lookup::Miss => None,
        }
    }

    /// Returns the hit value or `default` on miss.
    #[inline]
    pub fn unwrap_or(self, default: T) -> T {
        match self {
            Lookup::Hit(value) => value,
            Lookup::Miss => default,
        }
    }

    /// Borrows the hit value.
    #[inline]
    pub fn as_ref(&self) -> Lookup<&T> {
        match self {
            Lookup::Hit(value) => Lookup::Hit(value),
            Lookup::Miss => Lookup::Miss,
        }
    }

    /// Maps the hit value.
    #[inline]
    pub fn map<U, F>(self, f: F) -> Lookup<U>
    where
        F: FnOnce(T) -> U,
    {
        match self {
            Lookup::Hit(value) => Lookup::Hit(f(value)),
            Lookup::Miss => Lookup::Miss,
        }
    }

    /// Maps the hit value with a fallible function.
    pub fn try_map<U, E, F>(self, f: F) -> Result<Lookup<U>, E>
    where
        F: FnOnce(T) -> Result<U, E>,
    {
        match self {
            Lookup::Hit(value) => f(value).map(Lookup::Hit),
            Lookup::Miss => Ok(Lookup::Miss),
        }
    }
}

impl<T> From<Lookup<T>> for Option<T> {
    fn from(lookup: Lookup<T>) -> Self {
        lookup.into_option()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_none_is_still_a_hit() {
        let lookup: Lookup<Option<u8>> = Lookup::Hit(None);
        assert!(lookup.is_hit());
        assert_eq!(lookup.into_option(), Some(None));
    }

    #[test]
    fn miss_projects_to_none() {
        let lookup: Lookup<u8> = Lookup::Miss;
        assert!(lookup.is_miss());
        assert_eq!(lookup.clone().into_option(), None);
        assert_eq!(lookup.unwrap_or(7), 7);
    }

    #[test]
    fn try_map_short_circuits_on_miss() {
        let miss: Lookup<&str> = Lookup::Miss;
        let mapped: Result<Lookup<u8>, String> = miss.try_map(|_| Err("never called".into()));
        assert_eq!(mapped, Ok(Lookup::Miss));

        let hit = Lookup::Hit("42");
        let parsed: Result<Lookup<u8>, std::num::ParseIntError> = hit.try_map(str::parse);
        assert_eq!(parsed, Ok(Lookup::Hit(42)));
    }
}
