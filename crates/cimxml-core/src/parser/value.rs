//! `VALUE`, `VALUE.ARRAY` and literal conversion.

use super::Decoder;
use crate::convert::{
    check_sint_bounds, check_uint_bounds, parse_boolean, parse_real, parse_signed, parse_unsigned,
};
use crate::error::DecodeError;
use crate::model::{CimObject, CimType, CimValue, DateTime, Scalar};

impl Decoder {
    /// Convert the text of one `VALUE` to a scalar of type `ty`.
    ///
    /// Returns `None` only for an empty embedded object, which stands for
    /// null.
    pub(super) fn scalar_from_text(
        &self,
        text: &str,
        ty: CimType,
        line: u32,
    ) -> Result<Option<Scalar>, DecodeError> {
        let scalar = match ty {
            CimType::Boolean => Scalar::Boolean(parse_boolean(text).ok_or_else(|| {
                semantic(line, "Common.XmlReader.INVALID_BOOLEAN_VALUE", "Invalid boolean value")
            })?),
            CimType::String => Scalar::String(text.to_owned()),
            CimType::Char16 => {
                let mut chars = text.chars();
                match (chars.next(), chars.next()) {
                    (None, _) => Scalar::Char16('\0'),
                    (Some(c), None) if u32::from(c) <= 0xFFFF => Scalar::Char16(c),
                    _ => {
                        return Err(semantic(
                            line,
                            "Common.XmlReader.INVALID_CHAR16_VALUE",
                            "Invalid char16 value",
                        ))
                    }
                }
            }
            CimType::Uint8 | CimType::Uint16 | CimType::Uint32 | CimType::Uint64 => {
                unsigned_scalar(text, ty, line)?
            }
            CimType::Sint8 | CimType::Sint16 | CimType::Sint32 | CimType::Sint64 => {
                signed_scalar(text, ty, line)?
            }
            CimType::Real32 | CimType::Real64 => {
                let x = parse_real(text).ok_or_else(|| {
                    semantic(line, "Common.XmlReader.INVALID_RN_VALUE", "Invalid real number value")
                })?;
                if ty == CimType::Real32 {
                    #[allow(clippy::cast_possible_truncation)]
                    Scalar::Real32(x as f32)
                } else {
                    Scalar::Real64(x)
                }
            }
            CimType::DateTime => {
                if text.is_empty() {
                    Scalar::DateTime(DateTime::default())
                } else {
                    Scalar::DateTime(DateTime::parse(text).map_err(|_| {
                        semantic(
                            line,
                            "Common.XmlReader.INVALID_DATETIME_VALUE",
                            "Invalid datetime value",
                        )
                    })?)
                }
            }
            CimType::Reference => {
                return Err(semantic(
                    line,
                    "Common.XmlReader.MALFORMED_XML",
                    "malformed XML",
                ))
            }
            CimType::Object | CimType::Instance => {
                if text.is_empty() {
                    return Ok(None);
                }
                self.embedded_from_text(text, ty, line)?
            }
        };
        Ok(Some(scalar))
    }

    /// Decode the XML text of an embedded instance or class.
    fn embedded_from_text(&self, text: &str, ty: CimType, line: u32) -> Result<Scalar, DecodeError> {
        let mut inner = self.nested(text, line)?;
        inner.test_xml_declaration();

        let scalar = if let Some(instance) = inner.instance_element()? {
            if ty == CimType::Instance {
                Scalar::Instance(Box::new(instance))
            } else {
                Scalar::Object(Box::new(CimObject::Instance(instance)))
            }
        } else if ty == CimType::Instance {
            return Err(DecodeError::validation(
                line,
                "Common.XmlReader.EXPECTED_INSTANCE_ELEMENT",
                "Expected INSTANCE element".into(),
                Vec::new(),
            ));
        } else if let Some(class) = inner.class_element()? {
            Scalar::Object(Box::new(CimObject::Class(class)))
        } else {
            return Err(DecodeError::validation(
                line,
                "Common.XmlReader.EXPECTED_INSTANCE_OR_CLASS_ELEMENT",
                "Expected INSTANCE or CLASS element".into(),
                Vec::new(),
            ));
        };
        inner.expect_end_of_input()?;

        #[cfg(feature = "tracing")]
        tracing::debug!(depth = inner.depth(), ty = %scalar.cim_type(), "decoder: embedded object done");

        Ok(scalar)
    }

    /// Read the text of a `<VALUE>` or `<VALUE/>` if one is next.
    fn value_text(&mut self) -> Result<Option<(String, u32)>, DecodeError> {
        let Some(entry) = self.test_start_or_empty("VALUE") else {
            return Ok(None);
        };
        if entry.is_empty_tag() {
            return Ok(Some((String::new(), entry.line)));
        }
        let text = self.test_content().unwrap_or_default();
        let line = self.line();
        self.expect_end_tag("VALUE")?;
        Ok(Some((text, line)))
    }

    /// `<!ELEMENT VALUE (#PCDATA)>`
    ///
    /// An empty value converts as the empty string: it is `""` for
    /// strings, NUL for char16, the zero interval for datetimes, null for
    /// embedded objects, and an error for numbers and booleans.
    pub(super) fn value_element(&mut self, ty: CimType) -> Result<Option<CimValue>, DecodeError> {
        let Some((text, line)) = self.value_text()? else {
            return Ok(None);
        };
        Ok(Some(match self.scalar_from_text(&text, ty, line)? {
            Some(scalar) => CimValue::Scalar(scalar),
            None => CimValue::null(ty, false),
        }))
    }

    /// `<!ELEMENT VALUE.ARRAY (VALUE*)>`
    ///
    /// All element texts are collected before any is converted. An empty
    /// `VALUE` slot holds the zero value of the type.
    pub(super) fn value_array_element(&mut self, ty: CimType) -> Result<Option<CimValue>, DecodeError> {
        let Some(entry) = self.test_start_or_empty("VALUE.ARRAY") else {
            return Ok(None);
        };
        let mut texts = Vec::new();
        if !entry.is_empty_tag() {
            while let Some(text) = self.value_text()? {
                texts.push(text);
            }
            self.expect_end_tag("VALUE.ARRAY")?;
        }

        let mut items = Vec::with_capacity(texts.len());
        for (text, line) in texts {
            let scalar = if text.is_empty() {
                Scalar::default_for(ty)
            } else {
                self.scalar_from_text(&text, ty, line)?
            };
            let scalar = scalar.ok_or_else(|| {
                DecodeError::validation(
                    line,
                    "Common.XmlReader.EMPTY_ARRAY_ELEMENT",
                    format!("empty VALUE in {ty} array"),
                    vec![ty.to_string()],
                )
            })?;
            items.push(scalar);
        }

        #[cfg(feature = "tracing")]
        tracing::trace!(ty = %ty, len = items.len(), "decoder: VALUE.ARRAY");

        CimValue::array(ty, items)
            .map(Some)
            .map_err(|e| DecodeError::model(self.line(), "Common.XmlReader.ARRAY_TYPE_MISMATCH", e))
    }

    /// Any value form of type `ty`: `VALUE` or `VALUE.ARRAY`, and for
    /// references `VALUE.REFERENCE` or `VALUE.REFARRAY`.
    ///
    /// # Errors
    ///
    /// Returns a validation error if no value element is next.
    pub fn expect_value(&mut self, ty: CimType) -> Result<CimValue, DecodeError> {
        let value = if ty == CimType::Reference {
            if let Some(path) = self.value_reference_element()? {
                Some(CimValue::from(path))
            } else if let Some(paths) = self.value_reference_array_element()? {
                let items = paths.into_iter().map(Scalar::Reference).collect();
                Some(
                    CimValue::array(CimType::Reference, items)
                        .map_err(|e| DecodeError::model(self.line(), "Common.XmlReader.ARRAY_TYPE_MISMATCH", e))?,
                )
            } else {
                None
            }
        } else if let Some(value) = self.value_array_element(ty)? {
            Some(value)
        } else {
            self.value_element(ty)?
        };
        value.ok_or_else(|| {
            DecodeError::validation(
                self.next_line(),
                "Common.XmlReader.EXPECTED_VALUE_ELEMENT",
                "Expected VALUE element".into(),
                Vec::new(),
            )
        })
    }
}

fn semantic(line: u32, key: &'static str, message: &str) -> DecodeError {
    DecodeError::semantic(line, key, message.into(), Vec::new())
}

fn unsigned_scalar(text: &str, ty: CimType, line: u32) -> Result<Scalar, DecodeError> {
    let x = parse_unsigned(text).ok_or_else(|| {
        semantic(
            line,
            "Common.XmlReader.INVALID_UI_VALUE",
            "Invalid unsigned integer value",
        )
    })?;
    let out_of_range = |key: &'static str, label: &str| {
        DecodeError::semantic(line, key, format!("{label} value out of range"), vec![text.into()])
    };
    if !check_uint_bounds(x, ty) {
        return Err(match ty {
            CimType::Uint8 => out_of_range("Common.XmlReader.U8_VALUE_OUT_OF_RANGE", "Uint8"),
            CimType::Uint16 => out_of_range("Common.XmlReader.U16_VALUE_OUT_OF_RANGE", "Uint16"),
            _ => out_of_range("Common.XmlReader.U32_VALUE_OUT_OF_RANGE", "Uint32"),
        });
    }
    // In range, so the narrowing casts are exact.
    #[allow(clippy::cast_possible_truncation)]
    Ok(match ty {
        CimType::Uint8 => Scalar::Uint8(x as u8),
        CimType::Uint16 => Scalar::Uint16(x as u16),
        CimType::Uint32 => Scalar::Uint32(x as u32),
        _ => Scalar::Uint64(x),
    })
}

fn signed_scalar(text: &str, ty: CimType, line: u32) -> Result<Scalar, DecodeError> {
    let x = parse_signed(text).ok_or_else(|| {
        semantic(
            line,
            "Common.XmlReader.INVALID_SI_VALUE",
            "Invalid signed integer value",
        )
    })?;
    let out_of_range = |key: &'static str, label: &str| {
        DecodeError::semantic(line, key, format!("{label} value out of range"), vec![text.into()])
    };
    if !check_sint_bounds(x, ty) {
        return Err(match ty {
            CimType::Sint8 => out_of_range("Common.XmlReader.S8_VALUE_OUT_OF_RANGE", "Sint8"),
            CimType::Sint16 => out_of_range("Common.XmlReader.S16_VALUE_OUT_OF_RANGE", "Sint16"),
            _ => out_of_range("Common.XmlReader.S32_VALUE_OUT_OF_RANGE", "Sint32"),
        });
    }
    #[allow(clippy::cast_possible_truncation)]
    Ok(match ty {
        CimType::Sint8 => Scalar::Sint8(x as i8),
        CimType::Sint16 => Scalar::Sint16(x as i16),
        CimType::Sint32 => Scalar::Sint32(x as i32),
        _ => Scalar::Sint64(x),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CimInstance, DateTimeKind};

    fn decode(source: &str, ty: CimType) -> Result<CimValue, DecodeError> {
        Decoder::new(source)?.expect_value(ty)
    }

    #[test]
    fn test_uint8_bounds() {
        let err = decode("<VALUE>256</VALUE>", CimType::Uint8).unwrap_err();
        assert!(err.is_semantic());
        assert_eq!(err.key, "Common.XmlReader.U8_VALUE_OUT_OF_RANGE");

        assert_eq!(
            decode("<VALUE>255</VALUE>", CimType::Uint8).unwrap(),
            CimValue::from(255u8)
        );
        assert_eq!(
            decode("<VALUE>0xFF</VALUE>", CimType::Uint8).unwrap(),
            CimValue::from(255u8)
        );
    }

    #[test]
    fn test_syntax_vs_range() {
        let err = decode("<VALUE>12x</VALUE>", CimType::Uint32).unwrap_err();
        assert_eq!(err.key, "Common.XmlReader.INVALID_UI_VALUE");
        let err = decode("<VALUE>-129</VALUE>", CimType::Sint8).unwrap_err();
        assert_eq!(err.key, "Common.XmlReader.S8_VALUE_OUT_OF_RANGE");
        assert_eq!(
            decode("<VALUE>-0x80</VALUE>", CimType::Sint8).unwrap(),
            CimValue::from(-128i8)
        );
    }

    #[test]
    fn test_scalar_types() {
        assert_eq!(
            decode("<VALUE>true</VALUE>", CimType::Boolean).unwrap(),
            CimValue::from(true)
        );
        assert_eq!(
            decode("<VALUE>1.5e+00</VALUE>", CimType::Real64).unwrap(),
            CimValue::from(1.5f64)
        );
        assert_eq!(
            decode("<VALUE>\u{e9}</VALUE>", CimType::Char16).unwrap(),
            CimValue::Scalar(Scalar::Char16('\u{e9}'))
        );
        assert!(decode("<VALUE>ab</VALUE>", CimType::Char16).is_err());
        assert!(decode("<VALUE>maybe</VALUE>", CimType::Boolean).unwrap_err().is_semantic());
    }

    #[test]
    fn test_empty_value() {
        assert_eq!(decode("<VALUE/>", CimType::String).unwrap(), CimValue::from(""));
        let dt = decode("<VALUE></VALUE>", CimType::DateTime).unwrap();
        assert_eq!(
            dt.get_datetime().unwrap().map(DateTime::kind),
            Some(DateTimeKind::Interval)
        );
        assert_eq!(
            decode("<VALUE/>", CimType::Char16).unwrap(),
            CimValue::Scalar(Scalar::Char16('\0'))
        );
        assert!(decode("<VALUE/>", CimType::Uint8).is_err());
        assert!(decode("<VALUE/>", CimType::Instance).unwrap().is_null());
    }

    #[test]
    fn test_reference_inside_value() {
        let err = Decoder::new("<VALUE>x</VALUE>")
            .unwrap()
            .value_element(CimType::Reference)
            .unwrap_err();
        assert_eq!(err.key, "Common.XmlReader.MALFORMED_XML");
    }

    #[test]
    fn test_array_null_slots() {
        let value = decode(
            "<VALUE.ARRAY><VALUE>x</VALUE><VALUE/></VALUE.ARRAY>",
            CimType::String,
        )
        .unwrap();
        assert_eq!(
            value.as_array().unwrap(),
            &[Scalar::String("x".into()), Scalar::String(String::new())]
        );

        let value = decode(
            "<VALUE.ARRAY><VALUE>7</VALUE><VALUE/></VALUE.ARRAY>",
            CimType::Uint16,
        )
        .unwrap();
        assert_eq!(value.as_array().unwrap(), &[Scalar::Uint16(7), Scalar::Uint16(0)]);

        let value = decode("<VALUE.ARRAY/>", CimType::Sint32).unwrap();
        assert!(value.is_array());
        assert_eq!(value.len(), 0);
    }

    #[test]
    fn test_array_fails_as_a_whole() {
        let err = decode(
            "<VALUE.ARRAY>\n<VALUE>1</VALUE>\n<VALUE>300</VALUE>\n</VALUE.ARRAY>",
            CimType::Uint8,
        )
        .unwrap_err();
        assert_eq!(err.line, 3);
    }

    #[test]
    fn test_embedded_instance() {
        let source = "<VALUE>&lt;INSTANCE CLASSNAME=&quot;TST_Inner&quot;/&gt;</VALUE>";
        let value = decode(source, CimType::Instance).unwrap();
        assert_eq!(
            value.as_scalar(),
            Some(&Scalar::Instance(Box::new(CimInstance::new(
                crate::model::CimName::new("TST_Inner").unwrap()
            ))))
        );

        let value = decode(source, CimType::Object).unwrap();
        assert!(matches!(value.as_scalar(), Some(Scalar::Object(o)) if o.is_instance()));
    }

    #[test]
    fn test_embedded_class_payloads() {
        let source = "<VALUE>&lt;CLASS NAME=&quot;TST_C&quot;/&gt;</VALUE>";
        let value = decode(source, CimType::Object).unwrap();
        assert!(matches!(value.as_scalar(), Some(Scalar::Object(o)) if o.is_class()));

        let err = decode(source, CimType::Instance).unwrap_err();
        assert_eq!(err.key, "Common.XmlReader.EXPECTED_INSTANCE_ELEMENT");

        let err = decode("<VALUE>&lt;QUALIFIER/&gt;</VALUE>", CimType::Object).unwrap_err();
        assert_eq!(err.key, "Common.XmlReader.EXPECTED_INSTANCE_OR_CLASS_ELEMENT");
    }

    #[test]
    fn test_missing_value() {
        let err = decode("<VALUE.REFERENCE/>", CimType::String).unwrap_err();
        assert_eq!(err.key, "Common.XmlReader.EXPECTED_VALUE_ELEMENT");
    }
}
