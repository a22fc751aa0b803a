pub mod cms;
pub mod compliance;
pub mod exposed;
pub mod headers;
pub mod secrets;
pub mod seo;
pub mod tls;

use std::sync::Arc;

use crate::core::engine::Scanner;

/// The built-in scanner battery, in registration order.
pub fn default_scanners() -> Vec<Arc<dyn Scanner>> {
    vec![
        Arc::new(tls::TlsScanner),
        Arc::new(headers::HeadersScanner),
        Arc::new(exposed::ExposedFilesScanner),
        Arc::new(seo::SeoScanner),
        Arc::new(secrets::SecretsScanner),
        Arc::new(compliance::ComplianceScanner),
        Arc::new(cms::CmsScanner),
    ]
}
