//! Tests for the three-step stage model
