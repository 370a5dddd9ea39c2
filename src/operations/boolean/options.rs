use super::progress::CancellationToken;

/// How aggressively coinciding arguments are glued.
///
/// Gluing skips crossing computations and keeps only coincidence
/// detection, which is much faster for arguments that share faces but
/// never cross.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GlueMode {
    /// Full intersection.
    #[default]
    Off,
    /// Skip crossings for pairs whose boxes coincide.
    Shift,
    /// Skip crossings for every pair.
    Full,
}

/// Settings of a Boolean run.
#[derive(Debug, Clone)]
pub struct BooleanOptions {
    /// Extra distance under which shapes are treated as touching.
    pub fuzzy_value: f64,
    /// Leave argument tolerances untouched and copy reused shapes.
    pub non_destructive: bool,
    /// Gluing mode.
    pub glue: GlueMode,
    /// Skip the parameter-space images of split and section edges.
    pub avoid_pcurves: bool,
    /// Run pair intersections on the rayon pool.
    pub parallel: bool,
    /// Merge coplanar adjacent planar faces of the result.
    pub unify_faces: bool,
    /// Cooperative cancellation.
    pub cancel: Option<CancellationToken>,
}

impl Default for BooleanOptions {
    fn default() -> Self {
        Self {
            fuzzy_value: 0.0,
            non_destructive: true,
            glue: GlueMode::Off,
            avoid_pcurves: false,
            parallel: false,
            unify_faces: false,
            cancel: None,
        }
    }
}

impl BooleanOptions {
    /// Sets the fuzzy value. Negative values are treated as zero.
    #[must_use]
    pub fn with_fuzzy(mut self, value: f64) -> Self {
        self.fuzzy_value = value.max(0.0);
        self
    }

    #[must_use]
    pub fn with_non_destructive(mut self, value: bool) -> Self {
        self.non_destructive = value;
        self
    }

    #[must_use]
    pub fn with_glue(mut self, glue: GlueMode) -> Self {
        self.glue = glue;
        self
    }

    #[must_use]
    pub fn with_avoid_pcurves(mut self, value: bool) -> Self {
        self.avoid_pcurves = value;
        self
    }

    #[must_use]
    pub fn with_parallel(mut self, value: bool) -> Self {
        self.parallel = value;
        self
    }

    #[must_use]
    pub fn with_unify_faces(mut self, value: bool) -> Self {
        self.unify_faces = value;
        self
    }

    #[must_use]
    pub fn with_cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Returns `true` if the run was asked to stop.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancellationToken::is_cancelled)
    }
}
