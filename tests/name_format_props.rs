//! Property checks for display-name formatting and unique naming.

use matcat::core::{MaterialNamespace, NameFormat};
use proptest::prelude::*;
use std::collections::HashSet;

fn any_format() -> impl Strategy<Value = NameFormat> {
    ("[_.#-]{0,3}", any::<bool>(), any::<bool>()).prop_map(|(chars, caps, numbers)| NameFormat {
        enabled: true,
        replace_by_space: chars,
        add_space_by_caps: caps,
        add_space_between_word_and_number: numbers,
    })
}

proptest! {
    #[test]
    fn formatting_is_idempotent(f in any_format(), s in "[A-Za-z0-9_.#\\- ]{0,24}") {
        let once = f.apply(&s);
        prop_assert_eq!(f.apply(&once), once);
    }

    #[test]
    fn formatted_names_are_trimmed_single_spaced(s in "[A-Za-z0-9_ ]{0,24}") {
        let out = NameFormat::default().apply(&s);
        prop_assert!(!out.contains("  "));
        prop_assert!(!out.contains('_'));
        prop_assert_eq!(out.trim(), out.as_str());
    }

    #[test]
    fn disabled_format_is_identity(s in "\\PC{0,24}") {
        prop_assert_eq!(NameFormat::disabled().apply(&s), s);
    }

    #[test]
    fn claimed_names_never_collide(bases in prop::collection::vec("[A-C]{1,2}", 1..40)) {
        let mut ns = MaterialNamespace::new();
        let mut seen = HashSet::new();
        for b in &bases {
            let name = ns.claim(b);
            prop_assert!(name.starts_with(b.as_str()));
            prop_assert!(seen.insert(name));
        }
    }
}
