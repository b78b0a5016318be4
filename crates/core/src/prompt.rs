//! Permission-prompt strategy selection.
//!
//! Some browsers make a denied notification permission permanent. Those never
//! get the native prompt on first contact; the visitor sees a dismissible
//! slide-down first and the native request only follows an accept.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrowserVendor {
	Chrome,
	Firefox,
	Safari,
	Edge,
	Opera,
	Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormFactor {
	#[default]
	Desktop,
	Mobile,
	Tablet,
}

/// Major/minor browser version; orders lexicographically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct BrowserVersion {
	pub major: u32,
	pub minor: u32,
}

impl BrowserVersion {
	pub const fn new(major: u32, minor: u32) -> Self {
		Self { major, minor }
	}
}

impl std::fmt::Display for BrowserVersion {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}.{}", self.major, self.minor)
	}
}

/// Vendor, version and form factor of the visiting browser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowserIdentity {
	pub vendor: BrowserVendor,
	pub version: BrowserVersion,
	#[serde(default)]
	pub form_factor: FormFactor,
}

/// Chrome on phones and tablets blocks the origin permanently after one denial from this version on.
const CHROME_MOBILE_PERMANENT_DENIAL: BrowserVersion = BrowserVersion::new(63, 0);
/// Safari treats a denial as permanent on every form factor from this version on.
const SAFARI_PERMANENT_DENIAL: BrowserVersion = BrowserVersion::new(12, 1);

static EDGE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?:Edg|Edge|EdgiOS|EdgA)/(\d+)(?:\.(\d+))?").expect("edge pattern should compile"));
static OPERA: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?:OPR|Opera)/(\d+)(?:\.(\d+))?").expect("opera pattern should compile"));
static FIREFOX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?:Firefox|FxiOS)/(\d+)(?:\.(\d+))?").expect("firefox pattern should compile"));
static CHROME: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?:Chrome|CriOS)/(\d+)(?:\.(\d+))?").expect("chrome pattern should compile"));
static SAFARI: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"Version/(\d+)(?:\.(\d+))?.*Safari/").expect("safari pattern should compile"));

impl BrowserIdentity {
	pub const fn new(vendor: BrowserVendor, major: u32, minor: u32, form_factor: FormFactor) -> Self {
		Self {
			vendor,
			version: BrowserVersion::new(major, minor),
			form_factor,
		}
	}

	/// Parses a `User-Agent` header. Unknown agents come back as [`BrowserVendor::Other`] 0.0.
	pub fn from_user_agent(user_agent: &str) -> Self {
		let candidates: [(&Regex, BrowserVendor); 5] = [
			(&*EDGE, BrowserVendor::Edge),
			(&*OPERA, BrowserVendor::Opera),
			(&*FIREFOX, BrowserVendor::Firefox),
			(&*CHROME, BrowserVendor::Chrome),
			(&*SAFARI, BrowserVendor::Safari),
		];

		let (vendor, version) = candidates
			.iter()
			.find_map(|(pattern, vendor)| pattern.captures(user_agent).map(|caps| (*vendor, version_from(&caps))))
			.unwrap_or((BrowserVendor::Other, BrowserVersion::default()));

		Self {
			vendor,
			version,
			form_factor: form_factor_of(user_agent),
		}
	}

	pub fn is_handheld(&self) -> bool {
		matches!(self.form_factor, FormFactor::Mobile | FormFactor::Tablet)
	}

	/// Returns `true` when a denied native prompt cannot be undone by the visitor.
	pub fn denial_is_permanent(&self) -> bool {
		match self.vendor {
			BrowserVendor::Chrome => self.is_handheld() && self.version >= CHROME_MOBILE_PERMANENT_DENIAL,
			BrowserVendor::Safari => self.version >= SAFARI_PERMANENT_DENIAL,
			_ => false,
		}
	}
}

fn version_from(caps: &regex::Captures<'_>) -> BrowserVersion {
	let part = |idx: usize| caps.get(idx).and_then(|m| m.as_str().parse().ok()).unwrap_or(0);
	BrowserVersion::new(part(1), part(2))
}

fn form_factor_of(user_agent: &str) -> FormFactor {
	if user_agent.contains("iPad") || user_agent.contains("Tablet") || (user_agent.contains("Android") && !user_agent.contains("Mobile")) {
		FormFactor::Tablet
	} else if user_agent.contains("Mobile") || user_agent.contains("iPhone") || user_agent.contains("Android") {
		FormFactor::Mobile
	} else {
		FormFactor::Desktop
	}
}

/// Facts the strategy table is evaluated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptInputs {
	pub browser: BrowserIdentity,
	/// A prompt was already shown during this browsing session.
	pub prior_prompt_shown: bool,
	pub auto_register: bool,
	pub explicit_register_call: bool,
	pub modal_requested: bool,
	pub opted_out: bool,
}

/// Why no prompt is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Suppression {
	/// The full-screen modal path handles this request.
	ModalPath,
	/// The visitor opted out; the subscription is re-enabled without a permission prompt.
	OptedOut,
	/// A prompt was already shown this session.
	AlreadyPrompted,
	/// Neither auto-registration nor an explicit call asked for a prompt.
	NotRequested,
	/// The auxiliary frame never prompts; the top frame owns the visitor's attention.
	AuxiliaryFrame,
}

/// Outcome of [`select_strategy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PromptStrategy {
	Native,
	SlideDown,
	Suppressed(Suppression),
}

/// Picks the permission-request strategy; the first matching rule wins.
pub fn select_strategy(inputs: &PromptInputs) -> PromptStrategy {
	if inputs.explicit_register_call && inputs.modal_requested {
		return PromptStrategy::Suppressed(Suppression::ModalPath);
	}
	if inputs.browser.denial_is_permanent() && inputs.auto_register && !inputs.explicit_register_call {
		return PromptStrategy::SlideDown;
	}
	if inputs.opted_out {
		return PromptStrategy::Suppressed(Suppression::OptedOut);
	}
	if inputs.auto_register && !inputs.prior_prompt_shown {
		return PromptStrategy::Native;
	}
	if inputs.prior_prompt_shown {
		PromptStrategy::Suppressed(Suppression::AlreadyPrompted)
	} else {
		PromptStrategy::Suppressed(Suppression::NotRequested)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const CHROME_ANDROID_TABLET: &str = "Mozilla/5.0 (Linux; Android 9; SM-T820) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/65.0.3325.109 Safari/537.36";
	const CHROME_ANDROID_PHONE: &str =
		"Mozilla/5.0 (Linux; Android 10; Pixel 3) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/80.0.3987.99 Mobile Safari/537.36";
	const SAFARI_MAC: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_1) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/13.0.3 Safari/605.1.15";
	const FIREFOX_LINUX: &str = "Mozilla/5.0 (X11; Linux x86_64; rv:90.0) Gecko/20100101 Firefox/90.0";
	const EDGE_WINDOWS: &str =
		"Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36 Edg/91.0.864.59";

	fn inputs(browser: BrowserIdentity) -> PromptInputs {
		PromptInputs {
			browser,
			prior_prompt_shown: false,
			auto_register: true,
			explicit_register_call: false,
			modal_requested: false,
			opted_out: false,
		}
	}

	#[test]
	fn parses_common_agents() {
		assert_eq!(
			BrowserIdentity::from_user_agent(CHROME_ANDROID_TABLET),
			BrowserIdentity::new(BrowserVendor::Chrome, 65, 0, FormFactor::Tablet)
		);
		assert_eq!(
			BrowserIdentity::from_user_agent(CHROME_ANDROID_PHONE),
			BrowserIdentity::new(BrowserVendor::Chrome, 80, 0, FormFactor::Mobile)
		);
		assert_eq!(
			BrowserIdentity::from_user_agent(SAFARI_MAC),
			BrowserIdentity::new(BrowserVendor::Safari, 13, 0, FormFactor::Desktop)
		);
		assert_eq!(
			BrowserIdentity::from_user_agent(FIREFOX_LINUX),
			BrowserIdentity::new(BrowserVendor::Firefox, 90, 0, FormFactor::Desktop)
		);
		assert_eq!(BrowserIdentity::from_user_agent(EDGE_WINDOWS).vendor, BrowserVendor::Edge);
		assert_eq!(BrowserIdentity::from_user_agent("curl/8.0").vendor, BrowserVendor::Other);
	}

	#[test]
	fn chrome_tablet_gets_slide_down() {
		let browser = BrowserIdentity::new(BrowserVendor::Chrome, 65, 0, FormFactor::Tablet);
		assert_eq!(select_strategy(&inputs(browser)), PromptStrategy::SlideDown);
	}

	#[test]
	fn safari_gets_slide_down() {
		let browser = BrowserIdentity::new(BrowserVendor::Safari, 13, 0, FormFactor::Desktop);
		assert_eq!(select_strategy(&inputs(browser)), PromptStrategy::SlideDown);
	}

	#[test]
	fn firefox_gets_native() {
		let browser = BrowserIdentity::new(BrowserVendor::Firefox, 90, 0, FormFactor::Desktop);
		assert_eq!(select_strategy(&inputs(browser)), PromptStrategy::Native);
	}

	#[test]
	fn prior_prompt_suppresses() {
		let mut input = inputs(BrowserIdentity::new(BrowserVendor::Firefox, 90, 0, FormFactor::Desktop));
		input.prior_prompt_shown = true;
		assert_eq!(select_strategy(&input), PromptStrategy::Suppressed(Suppression::AlreadyPrompted));
	}

	#[test]
	fn desktop_chrome_and_old_versions_get_native() {
		let desktop = BrowserIdentity::new(BrowserVendor::Chrome, 90, 0, FormFactor::Desktop);
		assert_eq!(select_strategy(&inputs(desktop)), PromptStrategy::Native);

		let old_mobile = BrowserIdentity::new(BrowserVendor::Chrome, 62, 9, FormFactor::Mobile);
		assert_eq!(select_strategy(&inputs(old_mobile)), PromptStrategy::Native);

		let old_safari = BrowserIdentity::new(BrowserVendor::Safari, 12, 0, FormFactor::Desktop);
		assert_eq!(select_strategy(&inputs(old_safari)), PromptStrategy::Native);
	}

	#[test]
	fn explicit_modal_request_takes_precedence() {
		let mut input = inputs(BrowserIdentity::new(BrowserVendor::Safari, 13, 0, FormFactor::Desktop));
		input.explicit_register_call = true;
		input.modal_requested = true;
		input.opted_out = true;
		assert_eq!(select_strategy(&input), PromptStrategy::Suppressed(Suppression::ModalPath));
	}

	#[test]
	fn modal_without_explicit_call_is_ignored() {
		let mut input = inputs(BrowserIdentity::new(BrowserVendor::Firefox, 90, 0, FormFactor::Desktop));
		input.modal_requested = true;
		assert_eq!(select_strategy(&input), PromptStrategy::Native);
	}

	#[test]
	fn explicit_call_skips_slide_down() {
		let mut input = inputs(BrowserIdentity::new(BrowserVendor::Safari, 13, 0, FormFactor::Desktop));
		input.explicit_register_call = true;
		assert_eq!(select_strategy(&input), PromptStrategy::Native);
	}

	#[test]
	fn opted_out_is_suppressed() {
		let mut input = inputs(BrowserIdentity::new(BrowserVendor::Firefox, 90, 0, FormFactor::Desktop));
		input.opted_out = true;
		assert_eq!(select_strategy(&input), PromptStrategy::Suppressed(Suppression::OptedOut));
	}

	#[test]
	fn permanent_denial_browser_still_slides_down_when_opted_out() {
		let mut input = inputs(BrowserIdentity::new(BrowserVendor::Chrome, 70, 0, FormFactor::Mobile));
		input.opted_out = true;
		assert_eq!(select_strategy(&input), PromptStrategy::SlideDown);
	}

	#[test]
	fn nothing_requested_is_suppressed() {
		let mut input = inputs(BrowserIdentity::new(BrowserVendor::Firefox, 90, 0, FormFactor::Desktop));
		input.auto_register = false;
		assert_eq!(select_strategy(&input), PromptStrategy::Suppressed(Suppression::NotRequested));
	}
}
