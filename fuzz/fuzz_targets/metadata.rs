#![no_main]

use cilmeta::MetadataReader;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(reader) = MetadataReader::new(data) else {
        return;
    };

    for type_def in reader.type_definitions() {
        if let Ok(row) = reader.type_definition(type_def) {
            let _ = reader.decode_string(row.type_name);
        }
        if let Ok(fields) = reader.fields_of(type_def) {
            for field in fields {
                let _ = reader.declaring_type_of_field(field);
            }
        }
        let _ = reader.custom_attributes_of(type_def);
    }
});
