use regex::Regex;
use reqwest::Client;
use url::Url;

/// Parsed robots.txt rules applicable to our user agent
#[derive(Debug, Clone, Default)]
pub struct RobotsPolicy {
    rules: Vec<Rule>,
}

#[derive(Debug, Clone)]
struct Rule {
    is_allow: bool,
    path: String,
    regex: Option<Regex>,
}

#[derive(Debug, Default)]
struct Group {
    agents: Vec<String>,
    rules: Vec<Rule>,
}

impl RobotsPolicy {
    /// A policy that allows every path
    pub fn allow_all() -> Self {
        Self::default()
    }

    /// Parse robots.txt content, keeping the group that applies to `user_agent`
    pub fn parse(content: &str, user_agent: &str) -> Self {
        let groups = parse_groups(content);
        let ua = user_agent.to_lowercase();

        let specific = groups.iter().find(|group| {
            group
                .agents
                .iter()
                .any(|agent| agent != "*" && ua.contains(agent.as_str()))
        });
        let chosen =
            specific.or_else(|| groups.iter().find(|g| g.agents.iter().any(|a| a == "*")));

        Self {
            rules: chosen.map(|g| g.rules.clone()).unwrap_or_default(),
        }
    }

    /// Whether the URL's path (and query) may be fetched
    pub fn is_allowed(&self, url: &Url) -> bool {
        let target = match url.query() {
            Some(query) => format!("{}?{}", url.path(), query),
            None => url.path().to_string(),
        };
        self.is_path_allowed(&target)
    }

    /// Longest matching rule wins; Allow wins ties
    pub fn is_path_allowed(&self, path: &str) -> bool {
        let mut best: Option<(usize, bool)> = None;
        for rule in &self.rules {
            let matched = match &rule.regex {
                Some(regex) => regex.is_match(path),
                None => path.starts_with(&rule.path),
            };
            if !matched {
                continue;
            }
            let len = rule.path.len();
            best = match best {
                Some((best_len, best_allow))
                    if best_len > len || (best_len == len && best_allow) =>
                {
                    Some((best_len, best_allow))
                }
                _ => Some((len, rule.is_allow)),
            };
        }
        best.map(|(_, allow)| allow).unwrap_or(true)
    }
}

fn parse_groups(content: &str) -> Vec<Group> {
    let mut groups: Vec<Group> = Vec::new();
    let mut current = Group::default();
    let mut last_was_agent = false;

    for line in content.lines() {
        let line = line.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim().to_lowercase();
        let value = value.trim();

        match key.as_str() {
            "user-agent" => {
                if !last_was_agent && !current.agents.is_empty() {
                    groups.push(std::mem::take(&mut current));
                }
                current.agents.push(value.to_lowercase());
                last_was_agent = true;
            }
            "disallow" => {
                // An empty Disallow allows everything
                if !value.is_empty() {
                    current.rules.push(rule(false, value));
                }
                last_was_agent = false;
            }
            "allow" => {
                if !value.is_empty() {
                    current.rules.push(rule(true, value));
                }
                last_was_agent = false;
            }
            _ => last_was_agent = false,
        }
    }

    if !current.agents.is_empty() {
        groups.push(current);
    }
    groups
}

fn rule(is_allow: bool, path: &str) -> Rule {
    Rule {
        is_allow,
        path: path.to_string(),
        regex: pattern_regex(path),
    }
}

/// Only patterns using `*` or `$` need a regex; plain paths are prefix matches
fn pattern_regex(pattern: &str) -> Option<Regex> {
    if !pattern.contains('*') && !pattern.ends_with('$') {
        return None;
    }
    let (body, anchored) = match pattern.strip_suffix('$') {
        Some(body) => (body, true),
        None => (pattern, false),
    };
    let mut regex_pattern = format!("^{}", regex::escape(body).replace("\\*", ".*"));
    if anchored {
        regex_pattern.push('$');
    }
    Regex::new(&regex_pattern).ok()
}

/// Fetches `/robots.txt` at the seed's origin. Any failure means allow-all.
pub async fn fetch(client: &Client, seed: &Url, user_agent: &str) -> RobotsPolicy {
    let robots_url = match seed.join("/robots.txt") {
        Ok(url) => url,
        Err(_) => return RobotsPolicy::allow_all(),
    };

    let response = match client.get(robots_url.clone()).send().await {
        Ok(response) => response,
        Err(e) => {
            ::log::warn!("Could not fetch {}: {}, allowing all paths", robots_url, e);
            return RobotsPolicy::allow_all();
        }
    };

    if !response.status().is_success() {
        ::log::info!(
            "{} returned {}, allowing all paths",
            robots_url,
            response.status()
        );
        return RobotsPolicy::allow_all();
    }

    match response.text().await {
        Ok(body) => {
            let policy = RobotsPolicy::parse(&body, user_agent);
            ::log::info!(
                "Loaded {} robots.txt rules from {}",
                policy.rules.len(),
                robots_url
            );
            policy
        }
        Err(e) => {
            ::log::warn!("Could not read {}: {}, allowing all paths", robots_url, e);
            RobotsPolicy::allow_all()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const UA: &str = "Mozilla/5.0 (compatible; seo-crawl/0.1)";

    #[test]
    fn test_wildcard_group() {
        let content = r#"
User-agent: *
Disallow: /private/
Disallow: /admin/
Allow: /public/

User-agent: Googlebot
Disallow: /secret/
"#;
        let robots = RobotsPolicy::parse(content, UA);

        assert!(!robots.is_path_allowed("/private/secret"));
        assert!(!robots.is_path_allowed("/admin/dashboard"));
        assert!(robots.is_path_allowed("/public/info"));
        assert!(robots.is_path_allowed("/secret/data"));
    }

    #[test]
    fn test_specific_group_beats_wildcard() {
        let content = r#"
User-agent: *
Disallow: /

User-agent: other-bot
User-agent: seo-crawl
Disallow: /drafts/
"#;
        let robots = RobotsPolicy::parse(content, UA);

        assert!(robots.is_path_allowed("/blog/post"));
        assert!(!robots.is_path_allowed("/drafts/one"));
    }

    #[test]
    fn test_longest_match_and_allow_override() {
        let content = "User-agent: *\nDisallow: /shop/\nAllow: /shop/public/\n";
        let robots = RobotsPolicy::parse(content, UA);

        assert!(!robots.is_path_allowed("/shop/cart"));
        assert!(robots.is_path_allowed("/shop/public/item"));
    }

    #[test]
    fn test_wildcards_and_anchor() {
        let content = "User-agent: *\nDisallow: /temp*\nDisallow: /*.pdf$\n";
        let robots = RobotsPolicy::parse(content, UA);

        assert!(!robots.is_path_allowed("/temporary/file"));
        assert!(!robots.is_path_allowed("/docs/report.pdf"));
        assert!(robots.is_path_allowed("/docs/report.pdf.html"));
        assert!(robots.is_path_allowed("/about"));
    }

    #[test]
    fn test_empty_disallow_and_query() {
        let robots = RobotsPolicy::parse("User-agent: *\nDisallow:\n", UA);
        assert!(robots.is_path_allowed("/anything"));

        let robots = RobotsPolicy::parse("User-agent: *\nDisallow: /search?q=\n", UA);
        let url = Url::parse("https://example.test/search?q=shoes").unwrap();
        assert!(!robots.is_allowed(&url));
        let url = Url::parse("https://example.test/search").unwrap();
        assert!(robots.is_allowed(&url));
    }
}
