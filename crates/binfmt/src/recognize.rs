//! Root-shape recognizers.
//!
//! Each recognizer matches the decoded records against one fixed layout
//! written by the legacy serializer and extracts the value. Type names are
//! only compared against constants, never used to create anything. A
//! structural mismatch is `Ok(None)`; `Err` is reserved for streams that
//! match a layout but carry invalid data (bad decimal bits, say).

use crate::constants::{
    list_type_name, PrimitiveType, ARRAY_LIST_TYPE_NAME, DATE_TIME_MEMBER_NAMES,
    DECIMAL_MEMBER_NAMES, HASHTABLE_MEMBER_NAMES, HASHTABLE_TYPE_NAME, INTPTR_TYPE_NAME,
    LIST_MEMBER_NAMES, LIST_TYPE_PREFIX, NATIVE_INT_MEMBER_NAMES, PRIMITIVE_MEMBER_NAMES,
    SCALAR_ROOT_WHITELIST, TIME_SPAN_MEMBER_NAMES, UINTPTR_TYPE_NAME,
};
use crate::decoder::StreamDecoder;
use crate::error::DecodeError;
use crate::primitive::{DateTime, Decimal, PrimitiveValue, TimeSpan};
use crate::record::{ClassRecord, MemberType, MemberValue, Record};
use crate::value::Value;

impl StreamDecoder {
    /// The root class when it is a framework class with member types.
    fn root_system_class(&self) -> Result<Option<&ClassRecord>, DecodeError> {
        Ok(match self.root_record()? {
            Record::SystemClassWithMembersAndTypes(class) => Some(class),
            _ => None,
        })
    }

    /// A bare string root.
    pub fn try_get_string(&self) -> Result<Option<String>, DecodeError> {
        Ok(match self.root_record()? {
            Record::String(s) => Some(s.value.clone()),
            _ => None,
        })
    }

    /// A scalar root: a whitelisted `m_value` wrapper, or the dedicated
    /// layouts of native integers, time spans, date-times and decimals.
    pub fn try_get_primitive(&self) -> Result<Option<Value>, DecodeError> {
        let Some(class) = self.root_system_class()? else {
            return Ok(None);
        };
        let name = class.name();
        let info = &class.metadata.class_info;

        if info.has_members(&PRIMITIVE_MEMBER_NAMES) {
            let expected = SCALAR_ROOT_WHITELIST
                .iter()
                .find(|ty| ty.type_name() == name);
            return Ok(match (expected, typed_primitive(class, 0)) {
                (Some(ty), Some(value)) if value.primitive_type() == *ty => {
                    Some(Value::Primitive(value))
                }
                _ => None,
            });
        }

        if info.has_members(&NATIVE_INT_MEMBER_NAMES) {
            return Ok(match (name, typed_primitive(class, 0)) {
                (INTPTR_TYPE_NAME, Some(PrimitiveValue::Int64(v))) => Some(Value::NativeInt(v)),
                (UINTPTR_TYPE_NAME, Some(PrimitiveValue::UInt64(v))) => Some(Value::NativeUInt(v)),
                _ => None,
            });
        }

        if info.has_members(&TIME_SPAN_MEMBER_NAMES)
            && name == PrimitiveType::TimeSpan.type_name()
        {
            return Ok(match typed_primitive(class, 0) {
                Some(PrimitiveValue::Int64(ticks)) => Some(Value::Primitive(
                    PrimitiveValue::TimeSpan(TimeSpan::from_ticks(ticks)),
                )),
                _ => None,
            });
        }

        if info.has_members(&DATE_TIME_MEMBER_NAMES)
            && name == PrimitiveType::DateTime.type_name()
        {
            return match (typed_primitive(class, 0), typed_primitive(class, 1)) {
                (Some(PrimitiveValue::Int64(_)), Some(PrimitiveValue::UInt64(raw))) => {
                    let value = DateTime::from_raw(raw)?;
                    Ok(Some(Value::Primitive(PrimitiveValue::DateTime(value))))
                }
                _ => Ok(None),
            };
        }

        if info.has_members(&DECIMAL_MEMBER_NAMES) && name == PrimitiveType::Decimal.type_name()
        {
            let mut parts = [0i32; 4];
            for (position, part) in parts.iter_mut().enumerate() {
                match typed_primitive(class, position) {
                    Some(PrimitiveValue::Int32(v)) => *part = v,
                    _ => return Ok(None),
                }
            }
            let [flags, hi, lo, mid] = parts;
            let value = Decimal::from_parts(lo, mid, hi, flags)?;
            return Ok(Some(Value::Primitive(PrimitiveValue::Decimal(value))));
        }

        Ok(None)
    }

    /// `List<T>` of a scalar kind, or `List<string>`.
    pub fn try_get_primitive_list(&self) -> Result<Option<Value>, DecodeError> {
        let Some(class) = self.root_system_class()? else {
            return Ok(None);
        };
        if !class.name().starts_with(LIST_TYPE_PREFIX) {
            return Ok(None);
        }
        let Some(size) = self.list_size(class)? else {
            return Ok(None);
        };
        let Some(items) = class.members.first() else {
            return Ok(None);
        };
        match class.member_type(0) {
            Some(MemberType::PrimitiveArray(ty))
                if class.name() == list_type_name(ty.type_name()) =>
            {
                Ok(match self.resolve(items)? {
                    Some(Record::ArraySinglePrimitive(array))
                        if array.element_type == *ty && size <= array.values.len() =>
                    {
                        Some(Value::PrimitiveList(*ty, array.values[..size].to_vec()))
                    }
                    _ => None,
                })
            }
            Some(MemberType::StringArray)
                if class.name() == list_type_name(PrimitiveType::String.type_name()) =>
            {
                let Some(Record::ArraySingleString(array)) = self.resolve(items)? else {
                    return Ok(None);
                };
                if size > array.elements.len() {
                    return Ok(None);
                }
                Ok(self
                    .strings(&array.elements[..size])?
                    .map(Value::StringList))
            }
            _ => Ok(None),
        }
    }

    /// `ArrayList` whose elements are strings, scalars or nulls.
    pub fn try_get_array_list(&self) -> Result<Option<Value>, DecodeError> {
        let Some(class) = self.root_system_class()? else {
            return Ok(None);
        };
        if class.name() != ARRAY_LIST_TYPE_NAME
            || class.member_type(0) != Some(&MemberType::ObjectArray)
        {
            return Ok(None);
        }
        let Some(size) = self.list_size(class)? else {
            return Ok(None);
        };
        let Some(items) = class.members.first() else {
            return Ok(None);
        };
        let Some(Record::ArraySingleObject(array)) = self.resolve(items)? else {
            return Ok(None);
        };
        if size > array.elements.len() {
            return Ok(None);
        }
        let mut values = Vec::with_capacity(size);
        for element in &array.elements[..size] {
            match self.leaf(element)? {
                Some(value) => values.push(value),
                None => return Ok(None),
            }
        }
        Ok(Some(Value::ObjectList(values)))
    }

    /// A single-dimensional array of a scalar kind or of strings as the root.
    pub fn try_get_primitive_array(&self) -> Result<Option<Value>, DecodeError> {
        match self.root_record()? {
            Record::ArraySinglePrimitive(array) => Ok(Some(Value::PrimitiveArray(
                array.element_type,
                array.values.clone(),
            ))),
            Record::ArraySingleString(array) => {
                Ok(self.strings(&array.elements)?.map(Value::StringArray))
            }
            _ => Ok(None),
        }
    }

    /// `Hashtable` with default comparer, non-null string or scalar keys, and
    /// string, scalar or null values.
    pub fn try_get_primitive_hashtable(&self) -> Result<Option<Value>, DecodeError> {
        let Some(class) = self.root_system_class()? else {
            return Ok(None);
        };
        if class.name() != HASHTABLE_TYPE_NAME
            || !class.metadata.class_info.has_members(&HASHTABLE_MEMBER_NAMES)
        {
            return Ok(None);
        }
        let [_, _, comparer, provider, _, keys, values] = class.members.as_slice() else {
            return Ok(None);
        };
        if *comparer != MemberValue::Null || *provider != MemberValue::Null {
            return Ok(None);
        }
        let (Some(Record::ArraySingleObject(keys)), Some(Record::ArraySingleObject(values))) =
            (self.resolve(keys)?, self.resolve(values)?)
        else {
            return Ok(None);
        };
        if keys.elements.len() != values.elements.len() {
            return Ok(None);
        }
        let mut entries = Vec::with_capacity(keys.elements.len());
        for (key, value) in keys.elements.iter().zip(&values.elements) {
            let (Some(key), Some(value)) = (self.leaf(key)?, self.leaf(value)?) else {
                return Ok(None);
            };
            if key == Value::Null {
                return Ok(None);
            }
            entries.push((key, value));
        }
        Ok(Some(Value::Map(entries)))
    }

    /// Tries every recognizer in turn.
    pub fn try_get_value(&self) -> Result<Option<Value>, DecodeError> {
        if let Some(s) = self.try_get_string()? {
            return Ok(Some(Value::String(s)));
        }
        let recognizers: [fn(&Self) -> Result<Option<Value>, DecodeError>; 5] = [
            Self::try_get_primitive,
            Self::try_get_primitive_list,
            Self::try_get_array_list,
            Self::try_get_primitive_array,
            Self::try_get_primitive_hashtable,
        ];
        for recognize in recognizers {
            if let Some(value) = recognize(self)? {
                log::debug!("[binfmt] recognized {} root", value.kind());
                return Ok(Some(value));
            }
        }
        log::debug!("[binfmt] no recognized root shape");
        Ok(None)
    }

    /// `_size` of a list layout, when the members match `_items, _size,
    /// _version` and the size is not negative.
    fn list_size(&self, class: &ClassRecord) -> Result<Option<usize>, DecodeError> {
        if !class.metadata.class_info.has_members(&LIST_MEMBER_NAMES) {
            return Ok(None);
        }
        Ok(match typed_primitive(class, 1) {
            Some(PrimitiveValue::Int32(size)) => usize::try_from(size).ok(),
            _ => None,
        })
    }

    /// A string, scalar or null slot as a [`Value`]; `None` for anything else.
    fn leaf(&self, slot: &MemberValue) -> Result<Option<Value>, DecodeError> {
        Ok(match slot {
            MemberValue::Null => Some(Value::Null),
            MemberValue::Primitive(value) => Some(Value::Primitive(*value)),
            _ => match self.resolve(slot)? {
                Some(Record::String(s)) => Some(Value::String(s.value.clone())),
                _ => None,
            },
        })
    }

    /// Elements of a string array; `None` if any is not a string or null.
    fn strings(
        &self,
        elements: &[MemberValue],
    ) -> Result<Option<Vec<Option<String>>>, DecodeError> {
        let mut out = Vec::with_capacity(elements.len());
        for element in elements {
            match self.leaf(element)? {
                Some(Value::Null) => out.push(None),
                Some(Value::String(s)) => out.push(Some(s)),
                _ => return Ok(None),
            }
        }
        Ok(Some(out))
    }
}

/// Member `position` of a typed layout, if it is declared primitive.
fn typed_primitive(class: &ClassRecord, position: usize) -> Option<PrimitiveValue> {
    match (class.member_type(position)?, class.members.get(position)?) {
        (MemberType::Primitive(_), MemberValue::Primitive(value)) => Some(*value),
        _ => None,
    }
}
