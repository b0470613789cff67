//! # Dataflow Assembly
//!
//! A builder for declarative dataflow pipelines. Named stages (row-wise
//! transforms, aggregations, groupings, joins) are composed into a stage graph
//! while the builder tracks, at construction time, exactly which fields flow
//! out of every stage: their order, the primary key and the active grouping key.
//!
//! Nothing is executed here. The finished [`FlowPlan`] (stage graph plus the
//! final scope of every named branch) is handed to an execution engine.
//!
//! ## Quick Start
//!
//! ```rust
//! use dataflow_assembly::{EveryOptions, Flow, GroupByOptions, JoinOptions, NamedCapability};
//!
//! let mut flow = Flow::new("orders");
//! flow.source_with_key("customers", ["id", "name"], ["id"]).unwrap();
//! flow.source("payments", ["id", "amount"]).unwrap();
//! flow.assembly("customers", |a| {
//!     a.pass()?;
//!     Ok(())
//! })
//! .unwrap();
//! flow.assembly("payments", |a| {
//!     a.pass()?;
//!     Ok(())
//! })
//! .unwrap();
//! flow.assembly("totals", |a| {
//!     a.join(JoinOptions::on(["customers", "payments"], ["id"]))?;
//!     a.group_by_with(["id"], GroupByOptions::default(), |g| {
//!         g.every(["amount"], EveryOptions::aggregator(NamedCapability::new("sum")).output(["total"]))?;
//!         Ok(())
//!     })?;
//!     Ok(())
//! })
//! .unwrap();
//!
//! let plan = flow.finish();
//! assert_eq!(plan.scope("totals").unwrap().fields(), &["id".to_string(), "total".to_string()][..]);
//! ```

pub mod assembly;
pub mod config;
pub mod error;
pub mod plan;
pub mod schema;

// Public API - Main types users need
pub use assembly::{
    Aggregation, Assembly, AssertOptions, CopyOptions, EachOptions, EveryOptions, Flow, GroupByOptions,
    JoinInputs, JoinOptions, Parent,
};
pub use config::BuilderConfig;
pub use error::{AssemblyError, AssemblyResult};
pub use plan::{
    AssertionLevel, Capability, FlowPlan, Joiner, NamedCapability, Operation, Stage, StageGraph, StageId,
    StageKind, StageOperator,
};
pub use schema::{Fields, Grouping, Scope};
