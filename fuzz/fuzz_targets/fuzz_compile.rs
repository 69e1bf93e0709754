#![no_main]

use libfuzzer_sys::fuzz_target;
use paramforge_core::{
    compile_payload, reconcile, CompileOptions, RuleSet, SchemaTreeBuilder,
};

// Arbitrary bytes → rule set → schema → default instance → payload.
// Goal: compilation is total, so nothing here may panic.
fuzz_target!(|data: &[u8]| {
    let options = CompileOptions::default();
    if let Ok(rules) = serde_json::from_slice::<RuleSet>(data) {
        let schema = SchemaTreeBuilder::from_rules(&rules, &options);
        let _ = compile_payload(&reconcile(&schema, &[], &options));
    }
    if let Ok(example) = serde_json::from_slice::<serde_json::Value>(data) {
        let _ = SchemaTreeBuilder::from_example(&example, &options);
    }
    if let Ok(text) = std::str::from_utf8(data) {
        let _ = paramforge_core::scan_static(text);
        let _ = paramforge_core::parse_directives(text, &options);
    }
});
