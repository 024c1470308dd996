//! Mock and fake host collaborators.
