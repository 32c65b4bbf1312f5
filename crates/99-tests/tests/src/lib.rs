//! Cross-crate test suite for the XR frame pipeline.

#[cfg(test)]
mod loop_scenarios;

#[cfg(test)]
mod ring_discipline;

#[cfg(test)]
mod routing;
