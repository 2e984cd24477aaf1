//! # Reconcile
//!
//! Declared-vs-remote reconciliation for hierarchical fabric resources.
//!
//! Resources live under a root scope and are addressed by composite
//! identifiers (`F1/nodes/N1/breakouts/B1`). This crate folds remote
//! snapshots into declared models, plans changes with drift detection for
//! remote-derived attributes, and drives a REST collaborator through the
//! resource lifecycle.
//!
//! ## Core Concepts
//!
//! - **Attr**: A three-valued attribute (`Known`, `Null`, `Unknown`)
//! - **ResourceDescriptor**: Static description of one resource kind
//! - **ResourceModel**: Attribute map of a single resource instance
//! - **merge**: Folds a remote snapshot into a model
//! - **plan**: Proposes a change from desired model and prior state
//! - **Engine**: Read/create/update/delete/import against a [`Collaborator`]
//!
//! ## Example
//!
//! ```ignore
//! use reconcile::{Engine, ResourceModel, plan};
//!
//! let desired = ResourceModel::from_declared(&BREAKOUT, &declared)?;
//! let proposed = plan(&BREAKOUT, &desired, prior.as_ref())?;
//!
//! let engine = Engine::new(&client, &BREAKOUT);
//! let applied = match proposed.action {
//!     Action::Create => engine.create(&proposed.model)?,
//!     Action::Update => engine.update(&proposed.model)?,
//!     _ => engine.read(&proposed.model)?,
//! };
//! ```
//!
//! ## Collaborator
//!
//! The engine never talks HTTP itself. Callers pass an implementation of
//! [`Collaborator`], so the engine can run against a real API client or an
//! in-memory fake.

pub mod attr;
pub mod collaborator;
pub mod descriptor;
pub mod drift;
pub mod engine;
pub mod error;
pub mod id;
pub mod merge;
pub mod model;
pub mod plan;
pub mod semantic;
pub mod value;

pub use attr::Attr;
pub use collaborator::{Collaborator, child_path};
pub use descriptor::{Ancestor, Attribute, Mode, ResourceDescriptor};
pub use drift::{changed_inputs, reconcile_drift};
pub use engine::{Engine, build_payload, parse_id};
pub use error::{Error, Result};
pub use id::{CompositeId, Segment, compose, decompose, leaf_id};
pub use merge::{
    AncestorChain, AncestorResolver, MergeOutcome, ParentPathResolver, RemoteSnapshot, merge,
    merge_with,
};
pub use model::ResourceModel;
pub use plan::{Action, Plan, PlanSummary, plan};
pub use semantic::semantic_equals;
pub use value::{AttrKind, Field, Fields, Value, decode, encode};
