//! Emergency contact directory.

/// A callable emergency resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Contact {
    pub name: &'static str,
    pub detail: &'static str,
    /// Dialable number, digits and dashes only.
    pub phone: &'static str,
    pub address: Option<&'static str>,
}

impl Contact {
    /// `tel:` URI for the platform dialer.
    pub fn tel_uri(&self) -> String {
        tel_uri(self.phone)
    }
}

pub const ANIMAL_CONTROL: Contact = Contact {
    name: "Animal Control",
    detail: "24/7 Emergency Response",
    phone: "210-207-4738",
    address: None,
};

pub const EMERGENCY_VET: Contact = Contact {
    name: "Emergency Vet",
    detail: "VCA Becker Hospital",
    phone: "210-822-2873",
    address: None,
};

pub const MAIN_SHELTER: Contact = Contact {
    name: "Animal Care Services (ACS)",
    detail: "Main Shelter",
    phone: "210-207-4738",
    address: Some("4710 TX-151, San Antonio, TX 78227"),
};

/// Quick-dial entries, most urgent first.
pub const QUICK_DIAL: &[Contact] = &[ANIMAL_CONTROL, EMERGENCY_VET];

pub const RESOURCES: &[Contact] = &[MAIN_SHELTER];

pub const LIFE_THREATENING_NOTICE: &str =
    "For life-threatening emergencies, call 911 immediately";

pub const SAFETY_TIPS: &[&str] = &[
    "Do not approach aggressive animals",
    "Keep a safe distance from injured animals",
    "Never attempt to treat injuries yourself",
    "Call professionals for rabies concerns",
    "Document location and condition with photos",
];

/// Build a `tel:` URI, dropping everything except digits and a leading `+`.
pub fn tel_uri(number: &str) -> String {
    let mut out = String::from("tel:");
    for (i, ch) in number.trim().chars().enumerate() {
        if ch.is_ascii_digit() || (i == 0 && ch == '+') {
            out.push(ch);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tel_uri_strips_formatting() {
        assert_eq!(tel_uri("(210) 207-4738"), "tel:2102074738");
        assert_eq!(tel_uri("+1 210 822 2873"), "tel:+12108222873");
    }

    #[test]
    fn quick_dial_has_animal_control_first() {
        assert_eq!(QUICK_DIAL[0].name, "Animal Control");
        assert_eq!(QUICK_DIAL[0].tel_uri(), "tel:2102074738");
        assert_eq!(EMERGENCY_VET.tel_uri(), "tel:2108222873");
    }
}
