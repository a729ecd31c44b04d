/*!
 * Monitoring
 * Structured logging setup
 */

mod tracer;

pub use tracer::init_tracing;
