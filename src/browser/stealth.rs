/// Accept-Language sent with the client identity; storefronts are Brazilian.
pub const ACCEPT_LANGUAGE: &str = "pt-BR,pt;q=0.9,en-US;q=0.8,en;q=0.7";

/// Launch flags shared by every rendered session.
pub fn launch_args() -> Vec<String> {
    [
        "--disable-setuid-sandbox",
        "--disable-gpu",
        "--disable-dev-shm-usage",
        "--disable-extensions",
        "--mute-audio",
        "--no-first-run",
        "--disable-default-apps",
        "--disable-sync",
        "--disable-blink-features=AutomationControlled", // hide automation
        "--log-level=3",                                 // Only fatal errors
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}

/// Runs before any page script so `navigator.webdriver` reads as false.
pub fn webdriver_suppression_script() -> &'static str {
    r#"
    (function() {
        Object.defineProperty(navigator, 'webdriver', { get: () => false });
    })();
    "#
}

/// Platform string matching a user agent, for the user agent override.
pub fn platform_for(user_agent: &str) -> &'static str {
    if user_agent.contains("Windows") {
        "Win32"
    } else if user_agent.contains("Macintosh") {
        "MacIntel"
    } else {
        "Linux x86_64"
    }
}
