use rand::Rng;
use std::time::Duration;
use url::Url;

/// Politeness delay with uniform jitter of `jitter * base` in both directions
pub fn jittered_delay(base: Duration, jitter: f64) -> Duration {
    if base.is_zero() || jitter <= 0.0 {
        return base;
    }
    let factor = rand::rng().random_range((1.0 - jitter)..=(1.0 + jitter));
    base.mul_f64(factor)
}

/// File name stem for a site's reports: host without `www.`, dots as underscores
pub fn report_stem(url: &Url) -> String {
    let host = url.host_str().unwrap_or("site");
    let host = host.strip_prefix("www.").unwrap_or(host);
    host.replace(['.', ':'], "_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jitter_stays_in_range() {
        let base = Duration::from_millis(1000);
        for _ in 0..200 {
            let delay = jittered_delay(base, 0.5);
            assert!(delay >= Duration::from_millis(500), "{delay:?}");
            assert!(delay <= Duration::from_millis(1500), "{delay:?}");
        }
    }

    #[test]
    fn test_no_jitter_for_zero_delay() {
        assert_eq!(jittered_delay(Duration::ZERO, 0.5), Duration::ZERO);
        let base = Duration::from_millis(250);
        assert_eq!(jittered_delay(base, 0.0), base);
    }

    #[test]
    fn test_report_stem() {
        let url = Url::parse("https://www.example.co.uk/path").unwrap();
        assert_eq!(report_stem(&url), "example_co_uk");
        let url = Url::parse("http://127.0.0.1:8080/").unwrap();
        assert_eq!(report_stem(&url), "127_0_0_1");
    }
}
