//! The elemental composition type and its frozen, hashable counterpart.

use std::{
    cell::RefCell,
    collections::HashMap as StdHashMap,
    fmt::{self, Display, Formatter},
    hash::BuildHasher,
    ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign},
};

use ahash::HashMap;
use itertools::Itertools;
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::{
    Massive,
    count_table::CountTable,
    errors::{ChemicalCompositionError, Result},
    mass::{MassOptions, calculate_mass},
    mass_table::MassTable,
    parsers::parse_formula,
};

/// A signed multiset of chemical elements: the number of atoms of each
/// element (or isotope-tagged element) in a substance.
///
/// Keys with a count of zero are never stored: assigning zero removes the
/// key, and absent keys read as zero. Negative counts are legal and
/// represent subtraction shorthand, so `H-2O-1` is "minus one water".
///
/// Compositions add, subtract, and scale elementwise; the borrowed operators
/// build new instances, while the `*Assign` forms mutate the receiver.
/// Masses are memoized per `(average, charge, mass table)` and the memo is
/// dropped by every mutation. For use as a hash-map key, see
/// [`FrozenComposition`].
#[derive(Debug, Default)]
pub struct Composition {
    counts: CountTable<String>,
    mass_cache: RefCell<Option<MassCache>>,
}

#[derive(Copy, Clone, Debug)]
struct MassCache {
    average: bool,
    charge: Option<i64>,
    table_id: usize,
    mass: f64,
}

// Public API ==========================================================================================================

impl Composition {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `formula` against the built-in NIST mass table.
    pub fn from_formula(formula: impl AsRef<str>) -> Result<Self> {
        Self::from_formula_with(formula, MassTable::nist())
    }

    /// Parse `formula`, validating element symbols against `mass_data`.
    pub fn from_formula_with(formula: impl AsRef<str>, mass_data: &MassTable) -> Result<Self> {
        let mut composition = Self::new();
        for (key, count) in parse_formula(formula.as_ref(), mass_data)? {
            composition.accumulate(key, count);
        }
        Ok(composition)
    }

    /// Build a composition directly from key -> count pairs, without
    /// validating keys against any mass table. Explicit zero counts are
    /// copied as-is; they are invisible to equality and iteration.
    pub fn from_mapping(mapping: impl IntoIterator<Item = (impl Into<String>, i64)>) -> Self {
        let mut counts = CountTable::new();
        for (key, count) in mapping {
            counts.set(key.into(), count);
        }
        Self {
            counts,
            mass_cache: RefCell::new(None),
        }
    }

    pub fn builder<'t>() -> CompositionBuilder<'t> {
        CompositionBuilder::new()
    }

    /// The count stored under `key`, with absent keys reading as 0.
    pub fn get(&self, key: &str) -> i64 {
        self.counts.get(key)
    }

    /// Store `count` under `key`; a zero `count` removes the key instead.
    pub fn set(&mut self, key: impl Into<String>, count: i64) {
        self.invalidate_mass_cache();
        let key = key.into();
        if count == 0 {
            self.counts.remove(&key);
        } else {
            self.counts.set(key, count);
        }
    }

    /// Number of keys with a nonzero count.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    /// Iterate the nonzero entries, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> {
        self.counts
            .iter()
            .filter(|&(_, count)| count != 0)
            .map(|(key, count)| (key.as_str(), count))
    }

    /// Snapshot conversion into a plain hash map of the nonzero entries.
    pub fn to_mapping(&self) -> HashMap<String, i64> {
        self.iter().map(|(key, count)| (key.to_owned(), count)).collect()
    }

    /// The canonical formula rendering of this composition: keys sorted,
    /// every count written explicitly (water is `"H2O1"`). Re-parseable
    /// whenever all counts are positive.
    pub fn to_formula(&self) -> String {
        self.to_string()
    }

    /// The mass of this composition under the default [`MassOptions`]:
    /// monoisotopic, against the NIST table, charge read from `H+`.
    pub fn mass(&self) -> Result<f64> {
        self.mass_with(&MassOptions::default())
    }

    /// The mass of this composition under `options`, memoized until the
    /// composition next changes.
    pub fn mass_with(&self, options: &MassOptions) -> Result<f64> {
        let table_id = options.mass_data as *const MassTable as usize;
        if let Some(cache) = *self.mass_cache.borrow() {
            if cache.average == options.average
                && cache.charge == options.charge
                && cache.table_id == table_id
            {
                return Ok(cache.mass);
            }
        }

        let mass = calculate_mass(self, options)?;
        *self.mass_cache.borrow_mut() = Some(MassCache {
            average: options.average,
            charge: options.charge,
            table_id,
            mass,
        });
        Ok(mass)
    }

    /// An immutable, hashable snapshot of this composition.
    pub fn freeze(&self) -> FrozenComposition {
        FrozenComposition::from(self)
    }
}

// Private Helper Methods ==============================================================================================

impl Composition {
    /// `self[key] += delta`, removing the key if the sum lands on zero.
    /// Callers are responsible for cache invalidation.
    fn accumulate(&mut self, key: String, delta: i64) {
        if delta == 0 {
            return;
        }
        let count = self.counts.get(&key) + delta;
        if count == 0 {
            self.counts.remove(&key);
        } else {
            self.counts.set(key, count);
        }
    }

    fn invalidate_mass_cache(&mut self) {
        *self.mass_cache.get_mut() = None;
    }
}

// Clone, Equality, Display, and Serialization =========================================================================

impl Clone for Composition {
    fn clone(&self) -> Self {
        Self {
            counts: self.counts.clone(),
            mass_cache: RefCell::new(None),
        }
    }
}

impl PartialEq for Composition {
    fn eq(&self, other: &Self) -> bool {
        self.counts == other.counts
    }
}

impl Eq for Composition {}

impl<S: BuildHasher> PartialEq<StdHashMap<String, i64, S>> for Composition {
    /// A composition equals a plain mapping when their nonzero entries
    /// match, zero entries on either side notwithstanding.
    fn eq(&self, other: &StdHashMap<String, i64, S>) -> bool {
        self.iter().all(|(key, count)| other.get(key).copied().unwrap_or(0) == count)
            && other.iter().all(|(key, &count)| count == 0 || self.get(key) == count)
    }
}

impl Display for Composition {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (key, count) in self.iter().sorted() {
            write!(f, "{key}{count}")?;
        }
        Ok(())
    }
}

impl Serialize for Composition {
    /// Serializes the nonzero entries as a map with keys in sorted order,
    /// so equal compositions always produce identical output.
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (key, count) in self.iter().sorted() {
            map.serialize_entry(key, &count)?;
        }
        map.end()
    }
}

// Arithmetic Operators ================================================================================================

impl AddAssign<&Self> for Composition {
    fn add_assign(&mut self, rhs: &Self) {
        self.invalidate_mass_cache();
        for (key, count) in rhs.iter() {
            self.accumulate(key.to_owned(), count);
        }
    }
}

impl SubAssign<&Self> for Composition {
    fn sub_assign(&mut self, rhs: &Self) {
        self.invalidate_mass_cache();
        for (key, count) in rhs.iter() {
            self.accumulate(key.to_owned(), -count);
        }
    }
}

impl Add for &Composition {
    type Output = Composition;

    fn add(self, rhs: Self) -> Self::Output {
        let mut sum = self.clone();
        sum += rhs;
        sum
    }
}

impl Sub for &Composition {
    type Output = Composition;

    fn sub(self, rhs: Self) -> Self::Output {
        let mut difference = self.clone();
        difference -= rhs;
        difference
    }
}

impl Mul<i64> for &Composition {
    type Output = Composition;

    fn mul(self, scalar: i64) -> Self::Output {
        if scalar == 0 {
            return Composition::new();
        }
        let counts = self
            .iter()
            .map(|(key, count)| (key.to_owned(), count * scalar))
            .collect();
        Composition {
            counts,
            mass_cache: RefCell::new(None),
        }
    }
}

impl Neg for &Composition {
    type Output = Composition;

    fn neg(self) -> Self::Output {
        self * -1
    }
}

// Massive Trait Implementation ========================================================================================

impl Massive for Composition {
    fn monoisotopic_mass(&self) -> Result<f64> {
        self.mass_with(&MassOptions::default())
    }

    fn average_mass(&self) -> Result<f64> {
        self.mass_with(&MassOptions::default().averaged())
    }
}

// Builder =============================================================================================================

/// Keyword-style construction of a [`Composition`] from an optional formula
/// or mapping, with an optional mass table for formula validation.
///
/// Exactly one source may be given; both at once is an error, and neither
/// builds the empty composition.
#[derive(Clone, Debug, Default)]
pub struct CompositionBuilder<'t> {
    formula: Option<String>,
    mapping: Option<Vec<(String, i64)>>,
    mass_data: Option<&'t MassTable>,
}

impl<'t> CompositionBuilder<'t> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn formula(mut self, formula: impl Into<String>) -> Self {
        self.formula = Some(formula.into());
        self
    }

    #[must_use]
    pub fn mapping(mut self, mapping: impl IntoIterator<Item = (impl Into<String>, i64)>) -> Self {
        self.mapping = Some(
            mapping
                .into_iter()
                .map(|(key, count)| (key.into(), count))
                .collect(),
        );
        self
    }

    #[must_use]
    pub fn mass_data(mut self, mass_data: &'t MassTable) -> Self {
        self.mass_data = Some(mass_data);
        self
    }

    pub fn build(self) -> Result<Composition> {
        let mass_data = self.mass_data.unwrap_or(MassTable::nist());
        match (self.formula, self.mapping) {
            (Some(_), Some(_)) => Err(ChemicalCompositionError::ConflictingSources),
            (Some(formula), None) => Composition::from_formula_with(formula, mass_data),
            (None, Some(mapping)) => Ok(Composition::from_mapping(mapping)),
            (None, None) => Ok(Composition::new()),
        }
    }
}

// Frozen Compositions =================================================================================================

/// An immutable snapshot of a [`Composition`] with structural hashing, for
/// use as a set member or hash-map key.
///
/// Entries are zero-stripped and held in sorted order, so two frozen
/// compositions are equal (and hash alike) exactly when the compositions
/// they were taken from are.
#[derive(Clone, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct FrozenComposition {
    entries: Vec<(String, i64)>,
}

impl FrozenComposition {
    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> {
        self.entries.iter().map(|&(ref key, count)| (key.as_str(), count))
    }

    pub fn get(&self, key: &str) -> i64 {
        self.entries
            .binary_search_by(|(stored, _)| stored.as_str().cmp(key))
            .map_or(0, |index| self.entries[index].1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// A mutable composition holding the same entries.
    pub fn thaw(&self) -> Composition {
        Composition::from_mapping(self.iter().map(|(key, count)| (key.to_owned(), count)))
    }
}

impl From<&Composition> for FrozenComposition {
    fn from(composition: &Composition) -> Self {
        let entries = composition
            .iter()
            .map(|(key, count)| (key.to_owned(), count))
            .sorted()
            .collect();
        Self { entries }
    }
}

impl Display for FrozenComposition {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (key, count) in self.iter() {
            write!(f, "{key}{count}")?;
        }
        Ok(())
    }
}

impl Serialize for FrozenComposition {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (key, count) in self.iter() {
            map.serialize_entry(key, &count)?;
        }
        map.end()
    }
}

impl Massive for FrozenComposition {
    fn monoisotopic_mass(&self) -> Result<f64> {
        self.thaw().monoisotopic_mass()
    }

    fn average_mass(&self) -> Result<f64> {
        self.thaw().average_mass()
    }
}

// Module Tests ========================================================================================================
