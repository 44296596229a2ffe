//! Property-override scripts injected after session creation.
//!
//! The scripts returned by [`injection_scripts`] must be executed against a
//! fresh session in order, before the first page navigation: the webdriver
//! override comes first because it is the property detection code checks
//! first, and running any navigation before the overrides leaves a window
//! where the browser defaults are exposed.

use super::profile::StealthProfile;

/// Removes the `navigator.webdriver` automation flag.
///
/// This must ALWAYS be the first override applied.
const WEBDRIVER_OVERRIDE: &str =
    "Object.defineProperty(navigator, 'webdriver', {get: () => undefined});";

/// Presents a plausible `window.chrome` runtime object.
const CHROME_RUNTIME_OVERRIDE: &str =
    "Object.defineProperty(navigator, 'chrome', {get: () => ({runtime: {}})});";

/// Routes permission queries through a granted-by-default shim, keeping the
/// notification permission consistent with the real value.
const PERMISSIONS_OVERRIDE: &str = r#"
const originalQuery = window.navigator.permissions.query;
window.navigator.permissions.query = (parameters) => (
    parameters.name === 'notifications' ?
    Promise.resolve({ state: Notification.permission }) :
    originalQuery(parameters)
);
"#;

/// A headless browser exposes an empty plugin list; real Chrome ships the
/// internal PDF viewer.
const PLUGINS_OVERRIDE: &str = r#"
Object.defineProperty(navigator, 'plugins', {
    get: () => ([
        {
            0: {type: "application/x-google-chrome-pdf", suffixes: "pdf", description: "Portable Document Format", filename: "internal-pdf-viewer"},
            description: "Portable Document Format",
            filename: "internal-pdf-viewer",
            length: 1,
            name: "Chrome PDF Plugin"
        }
    ])
});
"#;

/// Adds sub-pixel jitter to canvas text rendering so canvas hashes differ
/// between sessions.
const CANVAS_NOISE_OVERRIDE: &str = r#"
const getContext = HTMLCanvasElement.prototype.getContext;
HTMLCanvasElement.prototype.getContext = function(type) {
    if (type === '2d') {
        const context = getContext.call(this, type);
        const originalFillText = context.fillText;
        context.fillText = function(text, x, y, maxWidth) {
            const noise = Math.random() * 0.1;
            return originalFillText.call(this, text, x + noise, y + noise, maxWidth);
        };
        return context;
    }
    return getContext.call(this, type);
};
"#;

/// Reports a common integrated GPU instead of the SwiftShader renderer
/// headless Chrome exposes. 37445/37446 are UNMASKED_VENDOR/RENDERER_WEBGL.
const WEBGL_OVERRIDE: &str = r#"
const getParameter = WebGLRenderingContext.prototype.getParameter;
WebGLRenderingContext.prototype.getParameter = function(parameter) {
    if (parameter === 37445) {
        return 'Intel Inc.';
    }
    if (parameter === 37446) {
        return 'Intel(R) Iris(TM) Graphics 6100';
    }
    return getParameter.call(this, parameter);
};
"#;

/// Returns the full ordered override sequence for a profile.
///
/// Position 0 is always the webdriver override; language and screen
/// overrides are derived from the profile so the JavaScript-visible values
/// agree with the launch arguments.
pub fn injection_scripts(profile: &StealthProfile) -> Vec<String> {
    let language_override = format!(
        "Object.defineProperty(navigator, 'language', {{get: () => '{}'}});\n\
         Object.defineProperty(navigator, 'languages', {{get: () => [{}]}});",
        profile.languages.first().map(String::as_str).unwrap_or("en-US"),
        profile
            .languages
            .iter()
            .map(|l| format!("'{}'", l))
            .collect::<Vec<_>>()
            .join(", ")
    );

    let screen_override = format!(
        "Object.defineProperty(screen, 'width', {{get: () => {w}}});\n\
         Object.defineProperty(screen, 'height', {{get: () => {h}}});\n\
         Object.defineProperty(screen, 'availWidth', {{get: () => {w}}});\n\
         Object.defineProperty(screen, 'availHeight', {{get: () => {h} - 40}});",
        w = profile.viewport.0,
        h = profile.viewport.1,
    );

    vec![
        WEBDRIVER_OVERRIDE.to_string(),
        CHROME_RUNTIME_OVERRIDE.to_string(),
        PERMISSIONS_OVERRIDE.to_string(),
        PLUGINS_OVERRIDE.to_string(),
        language_override,
        CANVAS_NOISE_OVERRIDE.to_string(),
        WEBGL_OVERRIDE.to_string(),
        screen_override,
    ]
}
