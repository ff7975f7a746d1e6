//! Email address syntax and canonical form.

use email_address::EmailAddress;

/// RFC 5321 path limit.
const MAX_ADDRESS_LEN: usize = 254;

const GMAIL_DOMAINS: &[&str] = &["gmail.com", "googlemail.com"];

const MICROSOFT_DOMAINS: &[&str] = &[
    "hotmail.com",
    "hotmail.co.uk",
    "hotmail.de",
    "hotmail.es",
    "hotmail.fr",
    "hotmail.it",
    "live.com",
    "live.co.uk",
    "live.fr",
    "msn.com",
    "outlook.com",
    "outlook.co.uk",
    "outlook.de",
    "outlook.fr",
    "passport.com",
];

const APPLE_DOMAINS: &[&str] = &["icloud.com", "me.com", "mac.com"];

const YAHOO_DOMAINS: &[&str] = &[
    "rocketmail.com",
    "yahoo.ca",
    "yahoo.co.uk",
    "yahoo.com",
    "yahoo.com.au",
    "yahoo.de",
    "yahoo.fr",
    "yahoo.in",
    "yahoo.it",
    "ymail.com",
];

const YANDEX_DOMAINS: &[&str] = &[
    "ya.ru",
    "yandex.by",
    "yandex.com",
    "yandex.kz",
    "yandex.ru",
    "yandex.ua",
];

/// True for a single bare address (no display name, no domain literal)
/// whose domain ends in an alphabetic or punycode TLD.
pub fn is_valid(address: &str) -> bool {
    if address.is_empty() || address.len() > MAX_ADDRESS_LEN {
        return false;
    }
    if address.chars().any(|c| c.is_whitespace() || c == '<' || c == '>') {
        return false;
    }
    if !EmailAddress::is_valid(address) {
        return false;
    }
    match address.rsplit_once('@') {
        Some((local, domain)) => !local.is_empty() && is_hostname_with_tld(domain),
        None => false,
    }
}

fn is_hostname_with_tld(domain: &str) -> bool {
    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 {
        return false;
    }
    let labels_ok = labels.iter().all(|label| {
        !label.is_empty()
            && label.len() <= 63
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_alphanumeric() || c == '-')
    });
    if !labels_ok {
        return false;
    }
    let tld = labels[labels.len() - 1];
    tld.chars().count() >= 2 && (tld.chars().all(char::is_alphabetic) || tld.starts_with("xn--"))
}

/// Validate and canonicalize an address.
///
/// The whole address is lower-cased. Known providers that ignore dots or
/// sub-address tags get those stripped so one mailbox has one spelling.
pub fn normalize(address: &str) -> Option<String> {
    if !is_valid(address) {
        return None;
    }
    let (local, domain) = address.rsplit_once('@')?;
    let mut local = local.to_lowercase();
    let mut domain = domain.to_lowercase();

    if GMAIL_DOMAINS.contains(&domain.as_str()) {
        local = strip_tag(&local, '+').replace('.', "");
        domain = "gmail.com".to_string();
    } else if MICROSOFT_DOMAINS.contains(&domain.as_str())
        || APPLE_DOMAINS.contains(&domain.as_str())
    {
        local = strip_tag(&local, '+').to_string();
    } else if YAHOO_DOMAINS.contains(&domain.as_str()) {
        local = match local.rsplit_once('-') {
            Some((head, _)) => head.to_string(),
            None => local,
        };
    } else if YANDEX_DOMAINS.contains(&domain.as_str()) {
        domain = "yandex.ru".to_string();
    }

    if local.is_empty() {
        return None;
    }
    Some(format!("{}@{}", local, domain))
}

fn strip_tag(local: &str, separator: char) -> &str {
    local.split(separator).next().unwrap_or(local)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowercases_whole_address() {
        assert_eq!(normalize("Mixed.Case@Example.ORG").as_deref(), Some("mixed.case@example.org"));
    }

    #[test]
    fn test_gmail_drops_dots_and_tags() {
        assert_eq!(
            normalize("Jane.Doe+news@GoogleMail.com").as_deref(),
            Some("janedoe@gmail.com")
        );
    }

    #[test]
    fn test_microsoft_and_apple_drop_plus_tags() {
        assert_eq!(normalize("john+promo@outlook.com").as_deref(), Some("john@outlook.com"));
        assert_eq!(normalize("john.smith+x@icloud.com").as_deref(), Some("john.smith@icloud.com"));
    }

    #[test]
    fn test_yahoo_drops_last_dash_tag() {
        assert_eq!(
            normalize("alice-list-promo@yahoo.com").as_deref(),
            Some("alice-list@yahoo.com")
        );
    }

    #[test]
    fn test_yandex_aliases_collapse() {
        assert_eq!(normalize("bob@ya.ru").as_deref(), Some("bob@yandex.ru"));
    }

    #[test]
    fn test_other_domains_keep_tags() {
        assert_eq!(normalize("team+ops@example.com").as_deref(), Some("team+ops@example.com"));
    }

    #[test]
    fn test_rejects_malformed_addresses() {
        for address in [
            "",
            "jane",
            "@example.com",
            "jane@",
            "jane@localhost",
            "jane@[127.0.0.1]",
            "Jane <jane@example.com>",
            "jane@@example.com",
            "jane@example..com",
            "jane doe@example.com",
            "jane@example.c0m",
            "jane@-example.com",
        ] {
            assert!(normalize(address).is_none(), "accepted {:?}", address);
        }
    }

    #[test]
    fn test_tag_only_gmail_local_part_is_rejected() {
        assert!(normalize("+tag@gmail.com").is_none());
    }
}
