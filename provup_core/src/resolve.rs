use crate::Diagnostic;
use crate::DiagnosticKind;
use crate::Diagnostics;
use crate::ProviderAddress;
use crate::RequirementMap;
use crate::addrs::ProviderAddr;
use crate::catalog::LookupError;
use crate::catalog::SourceCatalog;

/// Replace legacy provider addresses with canonical ones from the catalog.
///
/// Requirements that already declare a `source` are left alone. Providers
/// the catalog does not know become [`ProviderAddress::Unresolved`]; any
/// other lookup failure leaves the requirement unchanged. Both cases are
/// reported as warnings and never abort the run.
pub fn resolve(requirements: &mut RequirementMap, catalog: &dyn SourceCatalog) -> Diagnostics {
	let mut diagnostics = Diagnostics::new();

	for (name, requirement) in requirements.iter_mut() {
		if requirement.source.is_some() {
			tracing::debug!(name = %name, "source already declared");
			continue;
		}

		let legacy = ProviderAddr::new_legacy(requirement.type_name());
		match catalog.lookup_legacy(&legacy) {
			Ok(address) => {
				tracing::debug!(name = %name, legacy = %legacy.for_display(), address = %address, "resolved provider source");
				requirement.address = ProviderAddress::Resolved(address);
			}
			Err(error @ LookupError::NotKnown(_)) => {
				tracing::warn!(name = %name, "no source detected for provider");
				requirement.address = ProviderAddress::Unresolved;
				diagnostics.push(Diagnostic::new(
					DiagnosticKind::SourceNotDetected {
						name: name.clone(),
						reason: error.to_string(),
					},
					requirement.location.clone(),
				));
			}
			Err(error) => {
				tracing::warn!(name = %name, error = %error, "provider source lookup failed");
				diagnostics.push(Diagnostic::new(
					DiagnosticKind::SourceLookupFailed {
						name: name.clone(),
						reason: error.to_string(),
					},
					requirement.location.clone(),
				));
			}
		}
	}

	diagnostics
}
