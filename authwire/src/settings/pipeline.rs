//! Ordered stage pipeline.
//!
//! Extensions and middleware stages live in ordered lists where position
//! matters. Rather than computing list indices by hand, each entry the
//! mutator manages is declared as a [`StageSpec`]: a name plus a
//! [`Placement`] relative to other entries.
//!
//! # Invariants
//! - An entry already present is never moved or duplicated.
//! - A relative placement whose anchor is absent fails with
//!   [`SettingsError::AnchorNotFound`] and leaves the list untouched.

use super::SettingsError;

/// Where a stage goes when it is missing from its list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Immediately before the named anchor.
    Before(&'static str),
    /// Immediately after the named anchor.
    After(&'static str),
    /// Immediately after the last entry starting with any of the prefixes.
    /// Appends when no entry matches.
    AfterLastWithPrefix(&'static [&'static str]),
    /// At the end of the list.
    Append,
}

/// A named stage and its placement constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageSpec {
    pub name: &'static str,
    pub placement: Placement,
}

impl StageSpec {
    #[must_use]
    pub const fn new(name: &'static str, placement: Placement) -> Self {
        Self { name, placement }
    }
}

/// Index of `name` in `list`, if present.
#[must_use]
pub fn position(list: &[String], name: &str) -> Option<usize> {
    list.iter().position(|entry| entry == name)
}

/// Insert a single stage if it is missing.
///
/// Returns `true` when the stage was inserted.
///
/// # Errors
/// Returns `SettingsError::AnchorNotFound` if the placement names an anchor
/// that is not in `list`.
pub fn ensure_stage(
    list: &mut Vec<String>,
    list_name: &'static str,
    spec: &StageSpec,
) -> Result<bool, SettingsError> {
    if position(list, spec.name).is_some() {
        return Ok(false);
    }

    let index = insertion_index(list, list_name, spec.placement)?;
    list.insert(index, spec.name.to_string());
    Ok(true)
}

/// Insert every missing stage, in declaration order.
///
/// Either all stages are placed or the list is left unchanged.
///
/// # Returns
/// The names of the stages that were inserted.
///
/// # Errors
/// Returns `SettingsError::AnchorNotFound` for the first stage whose anchor
/// cannot be found.
pub fn ensure_all(
    list: &mut Vec<String>,
    list_name: &'static str,
    specs: &[StageSpec],
) -> Result<Vec<&'static str>, SettingsError> {
    let mut staged = list.clone();
    let mut added = Vec::new();

    for spec in specs {
        if ensure_stage(&mut staged, list_name, spec)? {
            added.push(spec.name);
        }
    }

    *list = staged;
    Ok(added)
}

fn insertion_index(
    list: &[String],
    list_name: &'static str,
    placement: Placement,
) -> Result<usize, SettingsError> {
    match placement {
        Placement::Before(anchor) => find_anchor(list, list_name, anchor),
        Placement::After(anchor) => find_anchor(list, list_name, anchor).map(|index| index + 1),
        Placement::AfterLastWithPrefix(prefixes) => Ok(list
            .iter()
            .rposition(|entry| prefixes.iter().any(|prefix| entry.starts_with(prefix)))
            .map_or(list.len(), |index| index + 1)),
        Placement::Append => Ok(list.len()),
    }
}

fn find_anchor(
    list: &[String],
    list_name: &'static str,
    anchor: &'static str,
) -> Result<usize, SettingsError> {
    position(list, anchor).ok_or_else(|| SettingsError::AnchorNotFound {
        list: list_name,
        anchor: anchor.to_string(),
    })
}
