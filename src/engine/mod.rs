//! Core engine: report assembly and the fetch → analyze → notify cycle.

pub mod cycle;
pub mod report;
