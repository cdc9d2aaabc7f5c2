use core::fmt;

/// Lifecycle shared by every aggregate in this crate
///
/// An execution engine creates one state per group with [`Default`], feeds it raw
/// rows through [`iterate`](Aggregate::iterate), and may snapshot it with
/// [`terminate_partial`](Aggregate::terminate_partial) at any time. Snapshots are
/// plain data and can be moved to another thread or process, where they are
/// folded into a sibling state with [`merge`](Aggregate::merge). Once every row
/// and partial of the group has been consumed, [`terminate`](Aggregate::terminate)
/// consumes the state and produces the result visible to the engine.
///
/// Implementations must make `merge` commutative and associative, so that any
/// call order over a fixed multiset of partials gives the same result up to
/// floating point rounding. No ordering between `iterate` and `merge` is assumed
/// beyond both happening before `terminate`.
///
/// # Examples
///
/// A minimal count aggregate:
///
/// ```
/// use udaf_statistics::Aggregate;
///
/// #[derive(Default)]
/// struct Count(u64);
///
/// impl Aggregate for Count {
///     type Input = Option<f64>;
///     type Partial = u64;
///     type Output = u64;
///
///     fn iterate(&mut self, input: Self::Input) {
///         self.0 += u64::from(input.is_some());
///     }
///     fn terminate_partial(&self) -> Self::Partial { self.0 }
///     fn merge(&mut self, partial: Self::Partial) { self.0 += partial }
///     fn terminate(self) -> Self::Output { self.0 }
/// }
///
/// let mut a = Count::default();
/// a.iterate(Some(1.0));
/// a.iterate(None);
/// let mut b = Count::default();
/// b.iterate(Some(2.0));
/// b.merge(a.terminate_partial());
/// assert_eq!(b.terminate(), 2);
/// ```
pub trait Aggregate: Default {
    /// One raw row, as delivered by the engine
    type Input;
    /// Transport-safe snapshot of an in-progress aggregation
    type Partial;
    /// Final result of the aggregation
    type Output;

    /// Folds one raw row into the state
    fn iterate(&mut self, input: Self::Input);

    /// Returns a snapshot of the state for a downstream `merge`
    fn terminate_partial(&self) -> Self::Partial;

    /// Folds a snapshot produced by a sibling aggregation into the state
    fn merge(&mut self, partial: Self::Partial);

    /// Consumes the state and produces the final result
    fn terminate(self) -> Self::Output;

    /// Returns the state to its freshly created form, keeping configuration
    fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Folds any number of partials into a state
///
/// # Arguments
///
/// * `state` - The state to fold into, usually freshly created
/// * `partials` - The partial aggregates to merge
///
/// # Returns
///
/// * `A` - The merged state
pub fn merge_all<A, I>(mut state: A, partials: I) -> A
where
    A: Aggregate,
    I: IntoIterator<Item = A::Partial>,
{
    partials.into_iter().for_each(|partial| state.merge(partial));
    state
}

/// Phase of a distributed aggregation
///
/// Decides which inputs an [`Evaluator`] accepts and what it emits:
///
/// | Mode       | consumes      | emits         |
/// |------------|---------------|---------------|
/// | `Partial1` | raw rows      | partial       |
/// | `Partial2` | partials      | partial       |
/// | `Final`    | partials      | final result  |
/// | `Complete` | raw rows      | final result  |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Map side: raw rows to a partial aggregate
    Partial1,
    /// Combiner: partial aggregates to a partial aggregate
    Partial2,
    /// Reduce side: partial aggregates to the final result
    Final,
    /// Single stage: raw rows to the final result
    Complete,
}

impl Mode {
    /// Returns `true` if this mode consumes raw rows
    #[inline]
    pub const fn consumes_rows(self) -> bool {
        matches!(self, Self::Partial1 | Self::Complete)
    }

    /// Returns `true` if this mode consumes partial aggregates
    #[inline]
    pub const fn consumes_partials(self) -> bool {
        !self.consumes_rows()
    }

    /// Returns `true` if this mode emits a partial aggregate
    #[inline]
    pub const fn emits_partial(self) -> bool {
        matches!(self, Self::Partial1 | Self::Partial2)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Partial1 => "PARTIAL1",
            Self::Partial2 => "PARTIAL2",
            Self::Final => "FINAL",
            Self::Complete => "COMPLETE",
        };
        f.write_str(name)
    }
}

/// What an [`Evaluator`] hands back to the engine when it finishes
#[derive(Debug, Clone, PartialEq)]
pub enum Emitted<P, O> {
    /// Partial aggregate, from `Partial1` and `Partial2`
    Partial(P),
    /// Final result, from `Final` and `Complete`
    Final(O),
}

impl<P, O> Emitted<P, O> {
    /// Returns the partial aggregate, if this is one
    pub fn into_partial(self) -> Option<P> {
        match self {
            Self::Partial(partial) => Some(partial),
            Self::Final(_) => None,
        }
    }

    /// Returns the final result, if this is one
    pub fn into_final(self) -> Option<O> {
        match self {
            Self::Final(output) => Some(output),
            Self::Partial(_) => None,
        }
    }
}

/// Drives one group's aggregate through the phase selected by its [`Mode`]
///
/// Feeding an input the mode does not accept is a bug in the driving engine and
/// panics instead of silently mixing raw rows with partials.
///
/// # Examples
///
/// ```
/// use udaf_statistics::{Evaluator, Mode, TTest};
///
/// let mut map_side = Evaluator::<TTest<f64>>::new(Mode::Partial1);
/// for row in [(Some(1.0), Some(2.0)), (Some(2.0), Some(4.0)), (Some(3.0), None)] {
///     map_side.iterate(row);
/// }
/// let partial = map_side.finish().into_partial().unwrap();
///
/// let mut reduce_side = Evaluator::<TTest<f64>>::new(Mode::Final);
/// reduce_side.merge(partial);
/// let result = reduce_side.finish().into_final().unwrap();
/// assert!(result.is_some());
/// ```
#[derive(Debug, Clone)]
pub struct Evaluator<A> {
    /// Phase of this evaluator
    mode: Mode,
    /// Aggregation state of the current group
    state: A,
}

impl<A: Aggregate> Evaluator<A> {
    /// Creates an evaluator with a fresh state
    ///
    /// # Arguments
    ///
    /// * `mode` - The aggregation phase
    ///
    /// # Returns
    ///
    /// * `Self` - The evaluator
    pub fn new(mode: Mode) -> Self {
        Self::with_state(mode, A::default())
    }

    /// Creates an evaluator around a configured state
    ///
    /// # Arguments
    ///
    /// * `mode` - The aggregation phase
    /// * `state` - The initial state, carrying its configuration
    ///
    /// # Returns
    ///
    /// * `Self` - The evaluator
    pub fn with_state(mode: Mode, state: A) -> Self {
        Self { mode, state }
    }

    /// Returns the aggregation phase
    #[inline]
    pub const fn mode(&self) -> Mode {
        self.mode
    }

    /// Returns the current state
    #[inline]
    pub const fn state(&self) -> &A {
        &self.state
    }

    /// Feeds one raw row
    ///
    /// # Panics
    ///
    /// If the mode consumes partial aggregates.
    pub fn iterate(&mut self, input: A::Input) -> &mut Self {
        assert!(
            self.mode.consumes_rows(),
            "raw row fed to an evaluator in {} mode",
            self.mode
        );
        self.state.iterate(input);
        self
    }

    /// Feeds one partial aggregate
    ///
    /// # Panics
    ///
    /// If the mode consumes raw rows.
    pub fn merge(&mut self, partial: A::Partial) -> &mut Self {
        assert!(
            self.mode.consumes_partials(),
            "partial aggregate fed to an evaluator in {} mode",
            self.mode
        );
        self.state.merge(partial);
        self
    }

    /// Resets the state for the next group
    pub fn reset(&mut self) -> &mut Self {
        self.state.reset();
        self
    }

    /// Consumes the evaluator and emits what its mode produces
    ///
    /// # Returns
    ///
    /// * `Emitted<A::Partial, A::Output>` - A partial for `Partial1`/`Partial2`,
    ///   the final result for `Final`/`Complete`
    pub fn finish(self) -> Emitted<A::Partial, A::Output> {
        tracing::trace!(mode = %self.mode, "finishing aggregation");
        if self.mode.emits_partial() {
            Emitted::Partial(self.state.terminate_partial())
        } else {
            Emitted::Final(self.state.terminate())
        }
    }
}
