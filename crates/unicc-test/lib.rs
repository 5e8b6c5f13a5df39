//! Cross-crate integration tests: scenarios from spec.md §8 that need more
//! than one crate wired together (a full `unicc::Parser` build, or an
//! `unicc-core` `LrAutomaton` inspected for conflict bookkeeping) rather
//! than a single module's unit tests. Kept as its own workspace member so
//! these don't need a `dev-dependency` cycle back onto `unicc` from
//! `unicc-core`.

#[cfg(test)]
mod test_dangling_else;

#[cfg(test)]
mod test_scannerless;
