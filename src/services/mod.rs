/**
 * ============================================================================
 * SERVICES MODULE
 * ============================================================================
 *
 * PURPOSE: Static description of the processes that make up the cluster
 *
 * SUBMODULES:
 * - types: ServiceSpec, TerminationSignature, ServiceStatus
 * - catalog: Ordered reference catalog with signature validation
 *
 * ============================================================================
 */

pub mod catalog;
pub mod types;

pub use catalog::ServiceCatalog;
pub use types::{ServiceSpec, ServiceStatus, TerminationSignature};
