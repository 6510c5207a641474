//! Predicate evaluation across the five filter axes
//!
//! A candidate is accepted iff, in order:
//! 1. `filter` matches its name (if set)
//! 2. `reject` does not match its name (if set)
//! 3. `filterVersion` matches its current version (if set)
//! 4. `rejectVersion` does not match its current version (if set)
//! 5. `filterResults` returns truthy for its name and version record (if set)
//!
//! Evaluation stops at the first failing axis, so later callbacks never see
//! candidates an earlier axis already rejected.

use log::debug;

use super::spec::Matcher;
use super::FilterError;
use crate::config::{Callback, CallbackInput, OptionValue, ResolvedOptions};
use crate::dependency::Candidate;

/// The compiled decision function for one invocation.
#[derive(Debug, Clone, Default)]
pub struct Predicate {
    filter: Option<Matcher>,
    reject: Option<Matcher>,
    filter_version: Option<Matcher>,
    reject_version: Option<Matcher>,
    filter_results: Option<Callback>,
}

impl Predicate {
    /// Compile the predicate axes of `options`.
    pub fn compile(options: &ResolvedOptions) -> Result<Self, FilterError> {
        // A blank spec constrains nothing and is treated as unset
        let axis = |name: &str| -> Result<Option<Matcher>, FilterError> {
            let Some(value) = options.get(name) else {
                return Ok(None);
            };
            let matcher = Matcher::compile(name, value)?;
            if matcher.is_blank() {
                debug!("{} is blank, ignoring", name);
                return Ok(None);
            }
            debug!("{} = {}", name, matcher.describe());
            Ok(Some(matcher))
        };

        let filter_results = match options.get("filterResults") {
            None => None,
            Some(OptionValue::Predicate(callback)) => Some(callback.clone()),
            Some(other) => {
                return Err(FilterError::InvalidSpec {
                    axis: "filterResults".to_string(),
                    message: format!("expected a function, got {}", other.kind_name()),
                })
            }
        };

        Ok(Self {
            filter: axis("filter")?,
            reject: axis("reject")?,
            filter_version: axis("filterVersion")?,
            reject_version: axis("rejectVersion")?,
            filter_results,
        })
    }

    /// True when no axis is configured.
    pub fn is_empty(&self) -> bool {
        self.filter.is_none()
            && self.reject.is_none()
            && self.filter_version.is_none()
            && self.reject_version.is_none()
            && self.filter_results.is_none()
    }

    /// Axes 1-4: decisions that need only the declared dependency.
    pub fn accepts_dependency<C: Candidate + ?Sized>(&self, candidate: &C) -> Result<bool, FilterError> {
        let name = candidate.name();
        let version = candidate.version_info().current_version;

        if let Some(filter) = &self.filter {
            if !filter.is_match("filter", CallbackInput::Name(name))? {
                return Ok(false);
            }
        }
        if let Some(reject) = &self.reject {
            if reject.is_match("reject", CallbackInput::Name(name))? {
                return Ok(false);
            }
        }
        if let Some(filter_version) = &self.filter_version {
            if !filter_version.is_match("filterVersion", CallbackInput::Version(version))? {
                return Ok(false);
            }
        }
        if let Some(reject_version) = &self.reject_version {
            if reject_version.is_match("rejectVersion", CallbackInput::Version(version))? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Axis 5: decision on a candidate whose upgrade has been resolved.
    pub fn accepts_result<C: Candidate + ?Sized>(&self, candidate: &C) -> Result<bool, FilterError> {
        let Some(callback) = &self.filter_results else {
            return Ok(true);
        };
        let name = candidate.name();
        let input = CallbackInput::Result {
            name,
            info: candidate.version_info(),
        };
        callback.call(input).map_err(|e| FilterError::Callback {
            axis: "filterResults".to_string(),
            subject: name.to_string(),
            message: e.to_string(),
        })
    }

    /// All five axes.
    pub fn accepts<C: Candidate + ?Sized>(&self, candidate: &C) -> Result<bool, FilterError> {
        Ok(self.accepts_dependency(candidate)? && self.accepts_result(candidate)?)
    }
}
