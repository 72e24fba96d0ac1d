//! Interface-name canonicalisation (§6.3, P3). Longest-prefix-first regex
//! list so that e.g. `TenGigabitEthernet1/0/1` and `Te1/0/1` collapse to
//! the same canonical form regardless of which vendor's CLI emitted them.
//! Ordering matters: long vendor-specific spellings are matched before the
//! short forms that would otherwise shadow them.

use regex::Regex;
use std::sync::LazyLock;

struct PrefixRule {
    pattern: Regex,
    replacement: &'static str,
}

fn rule(pattern: &str, replacement: &'static str) -> PrefixRule {
    PrefixRule {
        pattern: Regex::new(pattern).expect("static canonicalisation pattern must compile"),
        replacement,
    }
}

static PREFIX_MAP: LazyLock<Vec<PrefixRule>> = LazyLock::new(|| {
    vec![
        // Long forms, longest/most specific first.
        // HPE/Comware (hyphenated, to distinguish from Cisco's run-together spellings).
        rule(r"(?i)^Twenty-FiveGigabitEthernet", "WGE"),
        rule(r"(?i)^Twenty-FiveGigE", "WGE"),
        rule(r"(?i)^Ten-GigabitEthernet", "XGE"),
        rule(r"(?i)^TenGigE", "XGE"),
        rule(r"(?i)^FourHundredGigE", "FourHu"),
        rule(r"(?i)^TwoHundredGigE", "TwoHu"),
        rule(r"(?i)^HundredGigE", "HGE"),
        rule(r"(?i)^FortyGigE", "FGE"),
        rule(r"(?i)^Bridge-Aggregation", "BAGG"),
        rule(r"(?i)^Vlan-interface\s*", "Vlan"),
        // Cisco IOS / IOS-XE / IOS-XR.
        rule(r"(?i)^TwentyFiveGigabitEthernet", "Twe"),
        rule(r"(?i)^TwentyFiveGigE", "Twe"),
        rule(r"(?i)^HundredGigabitEthernet", "Hu"),
        rule(r"(?i)^FortyGigabitEthernet", "Fo"),
        rule(r"(?i)^TenGigabitEthernet", "TE"),
        rule(r"(?i)^GigabitEthernet", "GE"),
        rule(r"(?i)^FastEthernet", "FE"),
        rule(r"(?i)^Bundle-Ether", "BE"),
        rule(r"(?i)^Port-[Cc]hannel", "Po"),
        rule(r"(?i)^Management", "Mgmt"),
        rule(r"(?i)^Loopback", "Lo"),
        rule(r"(?i)^Tunnel", "Tu"),
        rule(r"(?i)^Vxlan", "VXLAN"),
        // NX-OS.
        rule(r"(?i)^Ethernet", "Eth"),
        rule(r"(?i)^Nve", "NVE"),
        // Juniper.
        rule(r"(?i)^ge-", "GE"),
        rule(r"(?i)^xe-", "XE"),
        rule(r"(?i)^et-", "ET"),
        rule(r"(?i)^ae(?=\d)", "AE"),
        rule(r"(?i)^IRB\.", "IRB"),
        // Short forms (2-6 chars + digits), placed after the long forms
        // they would otherwise shadow.
        rule(r"(?i)^FourHu(?=\d)", "FourHu"),
        rule(r"(?i)^TwoHu(?=\d)", "TwoHu"),
        rule(r"(?i)^XGE(?=[\d/])", "XGE"),
        rule(r"(?i)^WGE(?=[\d/])", "WGE"),
        rule(r"(?i)^FGE(?=[\d/])", "FGE"),
        rule(r"(?i)^HGE(?=[\d/])", "HGE"),
        rule(r"(?i)^BAGG(?=[\d.])", "BAGG"),
        rule(r"(?i)^MGE(?=[\d/])", "MGE"),
        rule(r"(?i)^MEth", "Mgmt"),
        rule(r"(?i)^Twe(?=\d)", "Twe"),
        rule(r"(?i)^Te(?=\d)", "TE"),
        rule(r"(?i)^Gi(?=\d)", "GE"),
        rule(r"(?i)^Ge(?=\d)", "GE"),
        rule(r"(?i)^Fa(?=\d)", "FE"),
        rule(r"(?i)^Fe(?=\d)", "FE"),
        rule(r"(?i)^Fo(?=\d)", "Fo"),
        rule(r"(?i)^Hu(?=\d)", "Hu"),
        rule(r"^Eth(?=[\d/])", "Eth"),
        rule(r"(?i)^Po(?=[\d.])", "Po"),
        rule(r"(?i)^BE(?=\d)", "BE"),
        rule(r"(?i)^NVE(?=\d)", "NVE"),
        rule(r"(?i)^BDI(?=\d)", "BDI"),
        rule(r"(?i)^Tu(?=\d)", "Tu"),
        rule(r"(?i)^Lo(?=\d)", "Lo"),
        rule(r"(?i)^Mgmt(?=\d)", "Mgmt"),
        rule(r"(?i)^Null(?=\d)", "Null"),
        rule(r"(?i)^Vlan(?=\d)", "Vlan"),
        rule(r"(?i)^VXLAN(?=\d)", "VXLAN"),
        // Linux.
        rule(r"^ens(?=\d)", "ENS"),
        rule(r"^bond(?=\d)", "BOND"),
        rule(r"^br(?=\d)", "BR"),
        rule(r"^eth(?=\d)", "ETH"),
    ]
});

/// Collapse a vendor-specific interface name spelling to its canonical
/// short form, preserving the slot/port suffix verbatim. Idempotent (P3):
/// canonicalising an already-canonical name returns it unchanged, since no
/// rule's replacement is itself matched by an earlier, more specific rule.
pub fn canonicalize_interface_name(name: &str) -> String {
    for rule in PREFIX_MAP.iter() {
        if let Some(m) = rule.pattern.find(name) {
            if m.start() == 0 {
                return format!("{}{}", rule.replacement, &name[m.end()..]);
            }
        }
    }
    name.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_long_and_short_cisco_forms() {
        assert_eq!(canonicalize_interface_name("GigabitEthernet1/0/1"), "GE1/0/1");
        assert_eq!(canonicalize_interface_name("Gi1/0/1"), "GE1/0/1");
    }

    #[test]
    fn collapses_hpe_and_cisco_port_channel_spellings() {
        assert_eq!(canonicalize_interface_name("Bridge-Aggregation1"), "BAGG1");
        assert_eq!(canonicalize_interface_name("BAGG1"), "BAGG1");
        assert_eq!(canonicalize_interface_name("Port-Channel1"), "Po1");
        assert_eq!(canonicalize_interface_name("Po1"), "Po1");
    }

    #[test]
    fn is_idempotent() {
        for name in ["GE1/0/1", "XGE1/0/1", "Eth1/1", "Po1", "BAGG1", "Lo0"] {
            let once = canonicalize_interface_name(name);
            let twice = canonicalize_interface_name(&once);
            assert_eq!(once, twice, "canonicalisation of {name} was not idempotent");
        }
    }

    #[test]
    fn leaves_unknown_prefixes_untouched() {
        assert_eq!(canonicalize_interface_name("Weird0"), "Weird0");
    }
}
