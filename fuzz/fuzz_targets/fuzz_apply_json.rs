#![no_main]

use libfuzzer_sys::fuzz_target;
use paramforge_core::{apply_json_edit, reconcile, CompileOptions, FieldType, SchemaNode};

// Raw editor text applied over a small fixed tree, then reconciled back.
fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let options = CompileOptions::default();
    let schema = vec![
        SchemaNode::new("name", FieldType::Text),
        SchemaNode {
            child_type: Some(FieldType::Number),
            ..SchemaNode::new("scores", FieldType::Array)
        },
    ];
    let tree = reconcile(&schema, &[], &options);
    if let Ok(edited) = apply_json_edit(text, &tree, &options) {
        let _ = reconcile(&schema, &edited, &options);
    }
});
