// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Canonical serialization and SHA-256 digests for tamper detection.
//
// The canonical form is the one ERASH ledgers were hashed with: object keys
// sorted by code point at every level, `", "` between items, `": "` after
// keys, and every character outside printable ASCII written as a lowercase
// `\uXXXX` escape (surrogate pairs above the BMP).  Block hashes in every
// `ledger_version` "1.0" file depend on this exact byte sequence.

use std::collections::BTreeMap;
use std::io;

use serde::{Serialize, Serializer};
use serde_json::Value;
use serde_json::ser::Formatter;
use sha2::{Digest, Sha256};
use wipewerk_core::error::{Result, WipewerkError};

/// Compute the SHA-256 hash of `data` and return it as a lowercase hex string.
pub fn hash_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    hex::encode(result)
}

/// Render `value` in canonical form.
pub fn canonical_json(value: &Value) -> Result<String> {
    let mut out = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut out, LedgerFormatter);
    Sorted(value).serialize(&mut ser)?;
    String::from_utf8(out)
        .map_err(|e| WipewerkError::Integrity(format!("canonical form is not ASCII: {e}")))
}

/// Serialize `value` to its canonical form.
pub fn to_canonical<T: Serialize>(value: &T) -> Result<String> {
    canonical_json(&serde_json::to_value(value)?)
}

/// SHA-256 hex digest of the canonical form of `value`.
pub fn digest_canonical<T: Serialize>(value: &T) -> Result<String> {
    Ok(hash_bytes(to_canonical(value)?.as_bytes()))
}

/// Re-sorts object keys while serializing, whatever map order `serde_json`
/// was built with.
struct Sorted<'a>(&'a Value);

impl Serialize for Sorted<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self.0 {
            Value::Array(items) => serializer.collect_seq(items.iter().map(Sorted)),
            Value::Object(map) => {
                let sorted: BTreeMap<&str, Sorted<'_>> =
                    map.iter().map(|(k, v)| (k.as_str(), Sorted(v))).collect();
                serializer.collect_map(sorted)
            }
            scalar => scalar.serialize(serializer),
        }
    }
}

/// Item separators and ASCII-only string output.
struct LedgerFormatter;

impl Formatter for LedgerFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first { Ok(()) } else { writer.write_all(b", ") }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first { Ok(()) } else { writer.write_all(b", ") }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }

    // Quotes, backslashes and C0 controls never reach here; serde_json
    // escapes those itself.
    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        let mut start = 0;
        for (i, c) in fragment.char_indices() {
            if (' '..='~').contains(&c) {
                continue;
            }
            writer.write_all(fragment[start..i].as_bytes())?;
            let mut units = [0u16; 2];
            for unit in c.encode_utf16(&mut units) {
                write!(writer, "\\u{unit:04x}")?;
            }
            start = i + c.len_utf8();
        }
        writer.write_all(fragment[start..].as_bytes())
    }
}
