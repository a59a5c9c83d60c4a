//! Eliminación selectiva de claves del diccionario `/Info` de un PDF.

use lopdf::{Dictionary, Document, Object};

use crate::error::SanitizeError;

/// Documento reescrito y claves que realmente se quitaron de `/Info`.
#[derive(Debug)]
pub struct StrippedPdf {
    pub bytes: Vec<u8>,
    pub removed: Vec<String>,
}

/// Quita `keys` de `/Info` y reescribe el documento.
///
/// Devuelve `None` si el documento no tiene `/Info` o ninguna clave estaba presente.
pub fn strip_pdf_info(bytes: &[u8], keys: &[&str]) -> Result<Option<StrippedPdf>, SanitizeError> {
    let mut doc = Document::load_mem(bytes)?;

    let info_ref = match doc.trailer.get(b"Info") {
        Ok(Object::Reference(id)) => Some(*id),
        Ok(Object::Dictionary(_)) => None,
        _ => return Ok(None),
    };

    let info: &mut Dictionary = match info_ref {
        Some(id) => doc.get_object_mut(id)?.as_dict_mut()?,
        None => doc.trailer.get_mut(b"Info")?.as_dict_mut()?,
    };

    let removed: Vec<String> = keys
        .iter()
        .filter(|key| info.remove(key.as_bytes()).is_some())
        .map(|key| key.to_string())
        .collect();
    if removed.is_empty() {
        return Ok(None);
    }

    if info.is_empty() {
        doc.trailer.remove(b"Info");
        if let Some(id) = info_ref {
            doc.objects.remove(&id);
        }
    }

    let mut output = Vec::new();
    doc.save_to(&mut output)?;
    Ok(Some(StrippedPdf {
        bytes: output,
        removed,
    }))
}
