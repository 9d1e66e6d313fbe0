use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
/// Levels of stealth applied to the browser session.
pub enum StealthProfile {
    Lightweight,
    Balanced,
    Maximum,
}

/// Window and identity settings folded into the Chrome command line.
#[derive(Debug, Clone)]
pub struct LaunchShape {
    pub window: (u32, u32),
    pub headless: bool,
    pub user_agent: Option<String>,
}

/// Construct Chrome command-line arguments for a stealth profile.
pub fn build_stealth_arguments(profile: StealthProfile, shape: &LaunchShape) -> Vec<String> {
    let mut args = vec![
        format!("--window-size={},{}", shape.window.0, shape.window.1),
        "--disable-blink-features=AutomationControlled".to_string(),
        "--disable-extensions".to_string(),
        "--no-sandbox".to_string(),
        "--disable-dev-shm-usage".to_string(),
    ];
    if profile != StealthProfile::Lightweight {
        args.push("--disable-infobars".to_string());
        args.push("--disable-plugins-discovery".to_string());
    }
    if let Some(agent) = &shape.user_agent {
        args.push(format!("--user-agent={agent}"));
    }
    if shape.headless {
        args.push("--headless=new".to_string());
        args.push("--disable-gpu".to_string());
    }
    args
}

/// JavaScript evasions applied after navigation to reduce automation signals.
pub struct StealthScripts;

impl StealthScripts {
    pub fn get_core_evasions() -> &'static str {
        r#"
            Object.defineProperty(navigator, 'webdriver', { get: () => undefined });
            Object.defineProperty(navigator, 'languages', {
                get: () => ['en-US', 'en']
            });
            if (!window.chrome) window.chrome = { runtime: {} };
        "#
    }

    pub fn get_webgl_evasions() -> &'static str {
        r#"
            const getParameter = WebGLRenderingContext.prototype.getParameter;
            WebGLRenderingContext.prototype.getParameter = function(parameter) {
                if (parameter === 37445) return 'Intel Inc.';
                if (parameter === 37446) return 'Intel Iris OpenGL Engine';
                return getParameter.call(this, parameter);
            };
        "#
    }

    /// Scripts for a profile, in the order they should run.
    pub fn for_profile(profile: StealthProfile) -> Vec<&'static str> {
        match profile {
            StealthProfile::Lightweight => vec![],
            StealthProfile::Balanced => vec![Self::get_core_evasions()],
            StealthProfile::Maximum => vec![Self::get_core_evasions(), Self::get_webgl_evasions()],
        }
    }
}
