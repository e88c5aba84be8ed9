//! Exact-answer-or-fallback resolution shared by the normalize, validate,
//! deduplicate and rank stages.
//!
//! A stage in mock mode gets a [`PrecomputedAnswerProvider`]: inputs that equal a
//! registered answer (after canonicalization) return that answer, everything else
//! runs the stage's deterministic fallback. A stage in live mode gets whatever
//! live implementation exists, or a [`LiveProvider`] that refuses to run.

use tracing::debug;

use crate::config::ListAnswer;
use crate::error::{PipelineError, Result};
use crate::metrics::StageMetrics;
use crate::pipeline::stage::Stage;
use crate::types::ProductRecord;

/// Inputs that can be put in a canonical form before comparison.
///
/// The default is the identity; collections whose order carries no meaning
/// override it.
pub trait Canonical: Clone + PartialEq {
    fn canonical(&self) -> Self {
        self.clone()
    }
}

impl Canonical for String {}

impl Canonical for Vec<ProductRecord> {
    /// Stable sort by product name, so equal names keep their relative order
    fn canonical(&self) -> Self {
        let mut sorted = self.clone();
        sorted.sort_by(|a, b| a.product_name.cmp(&b.product_name));
        sorted
    }
}

/// Precomputed answers keyed by canonical input.
///
/// Lookup is a linear scan comparing canonical inputs field by field; nothing is
/// hashed or derived from the input.
#[derive(Debug, Clone)]
pub struct AnswerTable<I, O> {
    entries: Vec<(I, O)>,
}

impl<I, O> Default for AnswerTable<I, O> {
    fn default() -> Self {
        Self { entries: Vec::new() }
    }
}

impl<I: Canonical, O: Clone> AnswerTable<I, O> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an answer. When two entries share a canonical input the earlier
    /// one is returned.
    pub fn insert(&mut self, input: I, output: O) {
        self.entries.push((input.canonical(), output));
    }

    /// A copy of the registered answer for `input`, if any
    pub fn lookup(&self, input: &I) -> Option<O> {
        let key = input.canonical();
        self.entries
            .iter()
            .find(|(registered, _)| *registered == key)
            .map(|(_, output)| output.clone())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<I: Canonical, O: Clone> FromIterator<(I, O)> for AnswerTable<I, O> {
    fn from_iter<T: IntoIterator<Item = (I, O)>>(iter: T) -> Self {
        let mut table = AnswerTable::new();
        for (input, output) in iter {
            table.insert(input, output);
        }
        table
    }
}

impl AnswerTable<Vec<ProductRecord>, Vec<ProductRecord>> {
    /// Table for the list-shaped stages (deduplicate, rank)
    pub fn from_list_answers(answers: &[ListAnswer]) -> Self {
        answers
            .iter()
            .map(|a| (a.input_products.clone(), a.output_products.clone()))
            .collect()
    }
}

/// How a stage arrived at its output
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution<O> {
    /// A registered answer matched the input
    Exact(O),
    /// No answer matched; the stage's fallback algorithm produced the output
    Fallback(O),
    /// A live implementation produced the output
    Computed(O),
}

impl<O> Resolution<O> {
    pub fn into_inner(self) -> O {
        match self {
            Resolution::Exact(o) | Resolution::Fallback(o) | Resolution::Computed(o) => o,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Resolution::Exact(_) => "exact",
            Resolution::Fallback(_) => "fallback",
            Resolution::Computed(_) => "computed",
        }
    }

    pub fn is_exact(&self) -> bool {
        matches!(self, Resolution::Exact(_))
    }
}

/// Exact answer if one is registered, otherwise the fallback algorithm.
pub struct FallbackMatcher<I, O> {
    table: AnswerTable<I, O>,
    fallback: fn(&I) -> O,
}

impl<I: Canonical, O: Clone> FallbackMatcher<I, O> {
    pub fn new(table: AnswerTable<I, O>, fallback: fn(&I) -> O) -> Self {
        Self { table, fallback }
    }

    pub fn resolve(&self, input: &I) -> Resolution<O> {
        match self.table.lookup(input) {
            Some(output) => Resolution::Exact(output),
            None => Resolution::Fallback((self.fallback)(input)),
        }
    }

    pub fn table(&self) -> &AnswerTable<I, O> {
        &self.table
    }
}

/// A stage's decision procedure, selected once at construction.
pub trait Resolver<I, O>: Send + Sync {
    fn stage(&self) -> Stage;

    /// Fails when the resolver cannot run at all. Stages call this before their
    /// first input so an unusable provider aborts even an empty run.
    fn ready(&self) -> Result<()> {
        Ok(())
    }

    fn resolve(&self, input: &I) -> Result<Resolution<O>>;
}

/// Mock-mode provider: answer table plus deterministic fallback
pub struct PrecomputedAnswerProvider<I, O> {
    stage: Stage,
    matcher: FallbackMatcher<I, O>,
}

impl<I: Canonical, O: Clone> PrecomputedAnswerProvider<I, O> {
    pub fn new(stage: Stage, table: AnswerTable<I, O>, fallback: fn(&I) -> O) -> Self {
        debug!("{} stage: {} precomputed answers registered", stage, table.len());
        Self {
            stage,
            matcher: FallbackMatcher::new(table, fallback),
        }
    }
}

impl<I, O> Resolver<I, O> for PrecomputedAnswerProvider<I, O>
where
    I: Canonical + Send + Sync,
    O: Clone + Send + Sync,
{
    fn stage(&self) -> Stage {
        self.stage
    }

    fn resolve(&self, input: &I) -> Result<Resolution<O>> {
        let resolution = self.matcher.resolve(input);
        debug!("{} stage resolved by {}", self.stage, resolution.kind());
        StageMetrics::record_resolution(self.stage, resolution.kind());
        Ok(resolution)
    }
}

/// Live-mode placeholder for stages without a live algorithm
#[derive(Debug, Clone, Copy)]
pub struct LiveProvider {
    stage: Stage,
}

impl LiveProvider {
    pub fn new(stage: Stage) -> Self {
        Self { stage }
    }
}

impl<I, O> Resolver<I, O> for LiveProvider {
    fn stage(&self) -> Stage {
        self.stage
    }

    fn ready(&self) -> Result<()> {
        Err(PipelineError::not_implemented(self.stage))
    }

    fn resolve(&self, _input: &I) -> Result<Resolution<O>> {
        Err(PipelineError::not_implemented(self.stage))
    }
}

/// Pick the provider for a stage that has no live algorithm.
pub fn select_provider<I, O>(
    stage: Stage,
    use_mock: bool,
    table: AnswerTable<I, O>,
    fallback: fn(&I) -> O,
) -> Box<dyn Resolver<I, O>>
where
    I: Canonical + Send + Sync + 'static,
    O: Clone + Send + Sync + 'static,
{
    if use_mock {
        Box::new(PrecomputedAnswerProvider::new(stage, table, fallback))
    } else {
        debug!("{} stage configured for live mode", stage);
        Box::new(LiveProvider::new(stage))
    }
}
