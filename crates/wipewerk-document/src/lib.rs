// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Wipewerk Document — certificate layout and PDF output.
//
// `layout` turns erasure data into a flat list of titled sections; `writer`
// renders any such list to PDF with `printpdf`'s built-in fonts.

pub mod layout;
pub mod writer;

pub use layout::{
    BulkCertificate, CertificateDocument, LedgerSection, Line, SingleCertificate,
    bulk_certificate, single_certificate,
};
pub use writer::{CertificateWriter, PageSize, StagedFile};
