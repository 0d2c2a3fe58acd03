/*!
 * Monitoring Module
 * Tracing setup and per-operation spans
 */

mod tracer;

pub use tracer::{generate_trace_id, init_tracing, OperationSpan};
