//! Public macros for constructing option structs without relying on struct literal syntax.
//!
//! Call sites stay valid when fields are added to [`crate::Options`] or
//! [`crate::Budget`].

/// Construct [`crate::Options`] from `Default` and a list of field assignments.
///
/// ```rust
/// use asdf_yaml::DuplicateKeyPolicy;
///
/// let options = asdf_yaml::options! {
///     duplicate_keys: DuplicateKeyPolicy::Error,
///     read_chunk_size: 4096,
/// };
/// assert_eq!(options.read_chunk_size, 4096);
/// ```
#[macro_export]
macro_rules! options {
    ( $( $field:ident : $value:expr ),* $(,)? ) => {{
        #[allow(unused_mut)]
        let mut opt = $crate::Options::default();
        $(
            opt.$field = $value;
        )*
        opt
    }};
}

/// Construct an enabled budget (`Some(`[`crate::Budget`]`)`) from `Default`
/// and a list of field assignments, ready to be assigned to
/// [`crate::Options::budget`].
///
/// ```rust
/// let options = asdf_yaml::options! {
///     budget: asdf_yaml::budget! {
///         max_depth: 16,
///         max_aliases: 10,
///     },
/// };
/// assert_eq!(options.budget.unwrap().max_depth, 16);
/// ```
#[macro_export]
macro_rules! budget {
    ( $( $field:ident : $value:expr ),* $(,)? ) => {{
        #[allow(unused_mut)]
        let mut budget = $crate::Budget::default();
        $(
            budget.$field = $value;
        )*
        ::core::option::Option::Some(budget)
    }};
}
