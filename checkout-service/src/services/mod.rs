pub mod catalog;
pub mod mercado_pago;
pub mod metrics;
pub mod preference;
pub mod provider;

pub use mercado_pago::MercadoPagoClient;
pub use metrics::{get_metrics, init_metrics};
pub use preference::PreferenceBuilder;
pub use provider::{PaymentProvider, ProviderError};
