//! End-to-end tests of the skfx pipeline live in `tests/`.
