#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|source: &str| {
    let _ = phonk::tokenize(source);
    if let Ok(sexp) = phonk::parse(source) {
        assert_eq!(phonk::parse(&sexp.to_string()).ok(), Some(sexp));
    }
    let _ = phonk::parse_program(source);
});
