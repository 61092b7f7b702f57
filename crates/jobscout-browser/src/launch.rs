use rand::Rng;
use std::path::PathBuf;
use std::time::Duration;

/// Common desktop user agents
const USER_AGENTS: [&str; 3] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36",
];

/// Common viewport sizes
const VIEWPORTS: [(u32, u32); 4] = [(1920, 1080), (1366, 768), (1536, 864), (1440, 900)];

/// How the Chromium session is launched.
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    pub headless: bool,
    /// Persistent profile directory; keeps the signed-in session between runs
    pub user_data_dir: Option<PathBuf>,
    pub proxy_server: Option<String>,
    pub user_agent: String,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub navigation_timeout: Duration,
    /// Minimum spacing between navigations to the same host
    pub min_navigation_interval: Duration,
}

impl LaunchOptions {
    /// Options with a randomized user agent and viewport.
    pub fn randomized() -> Self {
        let mut rng = rand::thread_rng();

        let ua_idx = rng.gen_range(0..USER_AGENTS.len());
        let vp_idx = rng.gen_range(0..VIEWPORTS.len());
        let (width, height) = VIEWPORTS[vp_idx];

        Self {
            headless: true,
            user_data_dir: None,
            proxy_server: None,
            user_agent: USER_AGENTS[ua_idx].to_string(),
            viewport_width: width,
            viewport_height: height,
            navigation_timeout: Duration::from_secs(20),
            min_navigation_interval: Duration::from_millis(1000),
        }
    }

    pub fn headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    pub fn user_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.user_data_dir = Some(dir.into());
        self
    }

    pub fn proxy_server(mut self, server: Option<String>) -> Self {
        self.proxy_server = server.filter(|s| !s.trim().is_empty());
        self
    }

    pub fn viewport(mut self, width: u32, height: u32) -> Self {
        self.viewport_width = width;
        self.viewport_height = height;
        self
    }

    pub fn navigation_timeout(mut self, timeout: Duration) -> Self {
        self.navigation_timeout = timeout;
        self
    }

    /// Extra Chromium command-line arguments implied by these options.
    pub fn chromium_args(&self) -> Vec<String> {
        let mut args = vec![
            format!("--user-agent={}", self.user_agent),
            "--disable-blink-features=AutomationControlled".to_string(),
            "--lang=en-US,ru-RU".to_string(),
        ];
        if let Some(proxy) = &self.proxy_server {
            args.push(format!("--proxy-server={proxy}"));
        }
        args
    }
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self::randomized()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_randomized_options() {
        let options = LaunchOptions::randomized();
        assert!(!options.user_agent.is_empty());
        assert!(options.viewport_width > 0);
        assert!(options.viewport_height > 0);
        assert!(options.headless);
    }

    #[test]
    fn test_user_agent_variation() {
        // Probabilistic, but ten identical draws out of three agents is very unlikely
        let options: Vec<_> = (0..10).map(|_| LaunchOptions::randomized()).collect();

        let first_ua = &options[0].user_agent;
        let all_same = options.iter().all(|o| &o.user_agent == first_ua);
        assert!(!all_same, "Expected variation in user agents");
    }

    #[test]
    fn test_chromium_args_include_proxy() {
        let options = LaunchOptions::randomized().proxy_server(Some("http://10.0.0.1:3128".into()));
        let args = options.chromium_args();
        assert!(args.contains(&"--proxy-server=http://10.0.0.1:3128".to_string()));
        assert!(args.iter().any(|a| a.starts_with("--user-agent=")));
    }

    #[test]
    fn test_blank_proxy_is_ignored() {
        let options = LaunchOptions::randomized().proxy_server(Some("  ".into()));
        assert!(options.proxy_server.is_none());
        assert!(!options.chromium_args().iter().any(|a| a.starts_with("--proxy-server")));
    }
}
