//! Recognition of license texts bundled inside release archives

use std::path::Path;

/// A license and the phrases that must all appear in its normalized text
struct Signature {
    id: &'static str,
    phrases: &'static [&'static str],
    absent: &'static [&'static str],
}

const MIT_GRANT: &str = "permission is hereby granted, free of charge, to any person obtaining a copy of this software and associated documentation files";

const SIGNATURES: &[Signature] = &[
    Signature {
        id: "MIT",
        phrases: &[
            MIT_GRANT,
            "the above copyright notice and this permission notice shall be included in all copies or substantial portions of the software",
        ],
        absent: &[],
    },
    Signature {
        id: "MIT-0",
        phrases: &[
            MIT_GRANT,
            "to deal in the software without restriction, including without limitation the rights to use, copy, modify, merge, publish, distribute, sublicense, and/or sell copies of the software",
        ],
        absent: &[],
    },
    Signature {
        id: "Apache-2.0",
        phrases: &["apache license", "version 2.0"],
        absent: &[],
    },
    Signature {
        id: "BSD-3-Clause",
        phrases: &[
            "redistribution and use in source and binary forms",
            "neither the name of",
        ],
        absent: &[],
    },
    Signature {
        id: "BSD-2-Clause",
        phrases: &["redistribution and use in source and binary forms"],
        absent: &["neither the name of"],
    },
];

/// Whether an archive entry looks like a license file
pub fn is_license_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| {
            let upper = n.to_ascii_uppercase();
            upper.starts_with("LICENSE") || upper.starts_with("LICENCE") || upper.starts_with("COPYING")
        })
        .unwrap_or(false)
}

/// SPDX identifiers whose signatures match `text`
///
/// A text can satisfy more than one signature; MIT satisfies MIT-0 as well.
pub fn identify(text: &str) -> Vec<&'static str> {
    let normalized = normalize(text);
    SIGNATURES
        .iter()
        .filter(|s| s.phrases.iter().all(|p| normalized.contains(p)))
        .filter(|s| !s.absent.iter().any(|p| normalized.contains(p)))
        .map(|s| s.id)
        .collect()
}

/// Lowercase and collapse whitespace so line wrapping does not matter
fn normalize(text: &str) -> String {
    text.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}
