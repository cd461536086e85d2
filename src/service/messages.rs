//! Client-facing envelope messages. Existing clients match on this wording.

use crate::config::ResolvedResource;
use std::fmt::Display;

pub const SERVER_ERROR: &str = "Terjadi kesalahan pada server";
pub const UPDATE_ROLLED_BACK: &str = "Gagal memperbarui data, semua perubahan dibatalkan";
pub const NOTHING_TO_DELETE: &str = "Tidak ada data yang cocok dengan ID yang diberikan untuk dihapus";
pub const DELETE_FAILED: &str = "Terjadi kesalahan pada server saat menghapus data";
pub const NO_UPDATABLE_FIELDS: &str = "Tidak ada field valid yang dikirim untuk diupdate.";
pub const EMPTY_BODY: &str = "Bad Request: Body tidak boleh kosong";
pub const INVALID_BODY: &str = "Bad Request: Body harus berupa objek atau array objek yang tidak kosong";

pub fn fetched(r: &ResolvedResource) -> String {
    format!("Data {} berhasil diambil", r.label)
}

pub fn not_found(r: &ResolvedResource, id: impl Display) -> String {
    format!("{} dengan ID {} tidak ditemukan", r.title(), id)
}

pub fn get_failed(r: &ResolvedResource, id: impl Display) -> String {
    format!("Terjadi kesalahan pada server saat mengambil {} ID {}", r.label, id)
}

pub fn required_fields(fields: &[&str]) -> String {
    let names: Vec<String> = fields.iter().map(|f| format!("'{}'", f)).collect();
    format!("Bad Request: Field {} wajib diisi", names.join(", "))
}

pub fn created(r: &ResolvedResource, batch: bool) -> String {
    if batch {
        format!("Beberapa {} baru berhasil dibuat", r.label)
    } else {
        format!("{} baru berhasil dibuat", r.title())
    }
}

pub fn create_failed(batch: bool) -> String {
    if batch {
        "Terjadi kesalahan pada server saat membuat banyak data".into()
    } else {
        "Terjadi kesalahan pada server saat membuat data".into()
    }
}

pub fn invalid_update(key: &str) -> String {
    let key = if key == "id" { "ID" } else { key };
    format!("Bad Request: Data input tidak valid, {} wajib ada.", key)
}

pub fn updated_many(r: &ResolvedResource, count: usize) -> String {
    format!("{} data {} berhasil diperbarui", count, r.label)
}

pub fn updated_one(r: &ResolvedResource, id: impl Display) -> String {
    format!("{} dengan ID {} berhasil diperbarui", r.title(), id)
}

pub fn bad_delete_body(field: &str) -> String {
    format!(
        "Bad Request: Body harus berisi properti '{}' dalam bentuk array dan tidak boleh kosong",
        field
    )
}

pub fn deleted(r: &ResolvedResource, count: u64) -> String {
    format!("{} data {} berhasil dihapus", count, r.label)
}
