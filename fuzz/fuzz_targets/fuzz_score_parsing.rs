#![no_main]

use libfuzzer_sys::fuzz_target;
use rankset::{Member, ScoreBound};

fuzz_target!(|data: &[u8]| {
    // Member identity survives decode -> encode.
    if let Ok(member) = Member::decode(data) {
        assert_eq!(&*member.encode(), data);
    }

    // A parsed bound prints back to something that parses to the same bound.
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(bound) = s.parse::<ScoreBound>() {
            let again: ScoreBound = bound.to_string().parse().expect("display output must parse");
            assert_eq!(again, bound);
        }
    }
});
