//! Property access: the generic slow paths and the cached fast paths.
//!
//! The slow paths implement the full semantics (prototype walk, accessors,
//! proxy traps, array elements, host objects). The cached variants probe
//! the access site's inline cache first and fall back to the slow path on a
//! miss, specializing the site afterwards (before, for writes).

use std::sync::Arc;

use core_types::{PropertyKey, Value};
use object_model::{ObjectClass, PropertyFlags, ProxyData, SlotValue};

use crate::error::{Abrupt, Eval};
use crate::inline_cache::{
    GetAction, GetCache, GetEntry, HasAction, HasCache, HasEntry, SetAction, SetCache, SetEntry,
};
use crate::interpreter::Interpreter;
use crate::operations::Hint;

/// One step of a prototype-chain walk.
enum Lookup {
    Found(Value),
    Getter(Option<core_types::ObjectId>),
    Next(core_types::ObjectId),
    Proxy(ProxyData),
}

/// Outcome of a property write that did not throw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Written {
    Done,
    ReadOnly,
    NotExtensible,
}

pub(crate) fn key_value(key: &PropertyKey) -> Value {
    match key {
        PropertyKey::String(s) => Value::String(s.clone()),
        PropertyKey::Symbol(symbol) => Value::Symbol(symbol.clone()),
    }
}

fn utf16_len(s: &str) -> usize {
    s.encode_utf16().count()
}

impl Interpreter {
    fn migrate(&mut self, id: core_types::ObjectId) {
        if let Some(object) = self.realm.heap.get_mut(id) {
            object.migrate_if_invalid(&self.realm.shapes);
        }
    }

    /// Invalidate `old`, the shape a prototype object just left. Every
    /// other holder of that shape migrates on its next slow-path access and
    /// cache entries keyed on it stop matching.
    fn invalidate_prototype_shape(&mut self, object: core_types::ObjectId, old: &Arc<object_model::Shape>) {
        let left = self
            .realm
            .heap
            .get(object)
            .map_or(false, |o| o.is_prototype() && !Arc::ptr_eq(o.shape(), old));
        if left {
            tracing::debug!(object = object.0, shape = old.id(), "prototype layout changed");
            self.realm.shapes.invalidate(old);
        }
    }

    fn object_or_fatal(&self, id: core_types::ObjectId) -> Eval<&object_model::JsObject> {
        self.realm
            .heap
            .get(id)
            .ok_or_else(|| Abrupt::fatal(format!("dangling object id {}", id.0)))
    }

    fn revoked(&mut self, operation: &str) -> Abrupt {
        self.type_error(format!(
            "Cannot perform '{}' on a proxy that has been revoked",
            operation
        ))
    }

    fn proxy_trap(&mut self, proxy: ProxyData, name: &str) -> Eval<Option<Value>> {
        if proxy.revoked {
            return Err(self.revoked(name));
        }
        let trap = self.get_property(&Value::Object(proxy.handler), &PropertyKey::from(name))?;
        if trap.is_nullish() {
            Ok(None)
        } else if self.is_callable(&trap) {
            Ok(Some(trap))
        } else {
            Err(self.type_error(format!("'{}' on proxy: trap is not a function", name)))
        }
    }

    /// `receiver[key]`.
    pub fn get_property(&mut self, receiver: &Value, key: &PropertyKey) -> Eval<Value> {
        let start = match receiver {
            Value::Object(id) => *id,
            Value::Undefined | Value::Null => {
                return Err(self.type_error(format!(
                    "Cannot read properties of {} (reading '{}')",
                    receiver, key
                )))
            }
            Value::String(s) => {
                if key.as_str() == Some("length") {
                    return Ok(Value::Smi(utf16_len(s) as i32));
                }
                if let Some(index) = key.array_index() {
                    let unit = s.encode_utf16().nth(index as usize);
                    return Ok(unit
                        .map(|unit| Value::string(&String::from_utf16_lossy(&[unit])))
                        .unwrap_or_default());
                }
                self.realm.intrinsics.string_prototype
            }
            other => match self.realm.primitive_prototype(other) {
                Some(proto) => proto,
                None => return Ok(Value::Undefined),
            },
        };
        self.get_from(start, key, receiver)
    }

    /// OrdinaryGet starting at `start`, with `receiver` as `this` for getters.
    pub(crate) fn get_from(
        &mut self,
        start: core_types::ObjectId,
        key: &PropertyKey,
        receiver: &Value,
    ) -> Eval<Value> {
        let mut current = start;
        loop {
            self.migrate(current);
            let object = self.object_or_fatal(current)?;
            let step = match object.class() {
                ObjectClass::Proxy(proxy) => Lookup::Proxy(*proxy),
                ObjectClass::Foreign(host) => Lookup::Found(host.read_member(key).unwrap_or_default()),
                ObjectClass::Array(elements)
                    if key.array_index().map_or(false, |i| elements.has(i)) =>
                {
                    let element = key.array_index().and_then(|i| elements.get(i));
                    Lookup::Found(element.cloned().unwrap_or_default())
                }
                ObjectClass::Array(elements) if key.as_str() == Some("length") => {
                    Lookup::Found(Value::number(f64::from(elements.len())))
                }
                _ => match object.own_property(key) {
                    Some((_, SlotValue::Data(value))) => Lookup::Found(value.clone()),
                    Some((_, SlotValue::Accessor { getter, .. })) => Lookup::Getter(*getter),
                    None => match object.prototype() {
                        Some(proto) => Lookup::Next(proto),
                        None => Lookup::Found(Value::Undefined),
                    },
                },
            };
            match step {
                Lookup::Found(value) => return Ok(value),
                Lookup::Getter(Some(getter)) => {
                    return self.call(&Value::Object(getter), receiver.clone(), &[])
                }
                Lookup::Getter(None) => return Ok(Value::Undefined),
                Lookup::Next(proto) => current = proto,
                Lookup::Proxy(proxy) => return self.proxy_get(proxy, key, receiver),
            }
        }
    }

    fn proxy_get(&mut self, proxy: ProxyData, key: &PropertyKey, receiver: &Value) -> Eval<Value> {
        match self.proxy_trap(proxy, "get")? {
            Some(trap) => self.call(
                &trap,
                Value::Object(proxy.handler),
                &[Value::Object(proxy.target), key_value(key), receiver.clone()],
            ),
            None => self.get_from(proxy.target, key, receiver),
        }
    }

    /// `receiver[key] = value`. Failed writes throw in strict code and are
    /// ignored otherwise.
    pub fn set_property(&mut self, receiver: &Value, key: PropertyKey, value: Value) -> Eval<()> {
        match self.set_slow(receiver, &key, value)? {
            Written::Done => Ok(()),
            failure => self.write_failed(receiver, &key, failure),
        }
    }

    fn write_failed(&mut self, receiver: &Value, key: &PropertyKey, failure: Written) -> Eval<()> {
        if !self.frame.strict {
            return Ok(());
        }
        let message = match (failure, receiver) {
            (Written::NotExtensible, Value::Object(_)) => {
                format!("Cannot add property {}, object is not extensible", key)
            }
            (_, Value::Object(_)) => {
                format!("Cannot assign to read only property '{}' of object", key)
            }
            (_, primitive) => format!(
                "Cannot create property '{}' on {} '{}'",
                key,
                self.type_of(primitive),
                primitive
            ),
        };
        Err(self.type_error(message))
    }

    fn set_slow(&mut self, receiver: &Value, key: &PropertyKey, value: Value) -> Eval<Written> {
        let target = match receiver {
            Value::Object(id) => *id,
            Value::Undefined | Value::Null => {
                return Err(self.type_error(format!(
                    "Cannot set properties of {} (setting '{}')",
                    receiver, key
                )))
            }
            other => {
                // Primitives only honor setters found on their prototype.
                let Some(proto) = self.realm.primitive_prototype(other) else {
                    return Ok(Written::ReadOnly);
                };
                return match self.find_setter(proto, key)? {
                    Some(Some(setter)) => {
                        self.call(&Value::Object(setter), receiver.clone(), &[value])?;
                        Ok(Written::Done)
                    }
                    _ => Ok(Written::ReadOnly),
                };
            }
        };
        self.set_on(target, key, value, receiver)
    }

    /// OrdinarySet starting at `target`. Setters see `receiver` as `this`;
    /// data writes land on `target`.
    fn set_on(
        &mut self,
        target: core_types::ObjectId,
        key: &PropertyKey,
        value: Value,
        receiver: &Value,
    ) -> Eval<Written> {
        let mut current = target;
        loop {
            self.migrate(current);
            let own = current == target;
            let object = self.object_or_fatal(current)?;
            match object.class() {
                ObjectClass::Proxy(proxy) => {
                    let proxy = *proxy;
                    return self.proxy_set(proxy, key, value, receiver);
                }
                ObjectClass::Foreign(_) if own => {
                    let accepted = match self.realm.heap.get_mut(current).map(|o| o.class_mut()) {
                        Some(ObjectClass::Foreign(host)) => host.write_member(key, value),
                        _ => false,
                    };
                    return Ok(if accepted { Written::Done } else { Written::ReadOnly });
                }
                ObjectClass::Array(_) if own && key.as_str() == Some("length") => {
                    self.set_array_length(current, value)?;
                    return Ok(Written::Done);
                }
                ObjectClass::Array(_) if own && key.array_index().is_some() => {
                    let index = key.array_index().unwrap_or_default();
                    return Ok(self.write_element(current, index, value));
                }
                _ => {}
            }
            match object.own_property(key) {
                Some((flags, SlotValue::Data(_))) if !flags.is_writable() => {
                    return Ok(Written::ReadOnly)
                }
                Some((_, SlotValue::Data(_))) if own => {
                    let slot = object
                        .shape()
                        .lookup(key)
                        .map(|entry| entry.slot)
                        .ok_or_else(|| Abrupt::fatal("shape lookup disagrees with own property"))?;
                    self.realm.heap[current].set_slot(slot, SlotValue::Data(value));
                    return Ok(Written::Done);
                }
                Some((_, SlotValue::Data(_))) => break,
                Some((_, SlotValue::Accessor { setter: Some(setter), .. })) => {
                    let setter = *setter;
                    self.call(&Value::Object(setter), receiver.clone(), &[value])?;
                    return Ok(Written::Done);
                }
                Some((_, SlotValue::Accessor { setter: None, .. })) => return Ok(Written::ReadOnly),
                None => match object.prototype() {
                    Some(proto) => current = proto,
                    None => break,
                },
            }
        }
        let object = &mut self.realm.heap[target];
        if !object.is_extensible() {
            return Ok(Written::NotExtensible);
        }
        object.add_property(
            &self.realm.shapes,
            key.clone(),
            SlotValue::Data(value),
            PropertyFlags::DEFAULT_DATA,
        );
        Ok(Written::Done)
    }

    /// Setter for `key` on the chain starting at `start`: `Some(Some(f))`
    /// for a setter, `Some(None)` for a read-only or setter-less property.
    fn find_setter(
        &mut self,
        start: core_types::ObjectId,
        key: &PropertyKey,
    ) -> Eval<Option<Option<core_types::ObjectId>>> {
        let mut current = Some(start);
        while let Some(id) = current {
            let object = self.object_or_fatal(id)?;
            match object.own_property(key) {
                Some((_, SlotValue::Accessor { setter, .. })) => return Ok(Some(*setter)),
                Some(_) => return Ok(Some(None)),
                None => current = object.prototype(),
            }
        }
        Ok(None)
    }

    fn write_element(&mut self, array: core_types::ObjectId, index: u32, value: Value) -> Written {
        let dense_limit = self.config.dense_element_limit;
        let object = &mut self.realm.heap[array];
        let extensible = object.is_extensible();
        let Some(elements) = object.elements_mut() else {
            return Written::ReadOnly;
        };
        if let Some(slot) = elements.get_mut(index) {
            *slot = value;
            return Written::Done;
        }
        if !extensible {
            return Written::NotExtensible;
        }
        elements.set(index, value, dense_limit);
        Written::Done
    }

    pub(crate) fn set_array_length(&mut self, array: core_types::ObjectId, value: Value) -> Eval<()> {
        let number = self.to_number(&value)?;
        if number < 0.0 || number.fract() != 0.0 || number > u32::MAX as f64 {
            return Err(self.throw_error(core_types::JsError::range_error("Invalid array length")));
        }
        if let Some(elements) = self.realm.heap[array].elements_mut() {
            elements.set_len(number as u32);
        }
        Ok(())
    }

    fn proxy_set(
        &mut self,
        proxy: ProxyData,
        key: &PropertyKey,
        value: Value,
        receiver: &Value,
    ) -> Eval<Written> {
        match self.proxy_trap(proxy, "set")? {
            Some(trap) => {
                let result = self.call(
                    &trap,
                    Value::Object(proxy.handler),
                    &[Value::Object(proxy.target), key_value(key), value, receiver.clone()],
                )?;
                Ok(if result.is_truthy() { Written::Done } else { Written::ReadOnly })
            }
            None => self.set_on(proxy.target, key, value, receiver),
        }
    }

    /// `key in object`.
    pub fn has_property(&mut self, object: &Value, key: &PropertyKey) -> Eval<bool> {
        let Some(mut current) = object.as_object() else {
            return Err(self.type_error(format!(
                "Cannot use 'in' operator to search for '{}' in {}",
                key, object
            )));
        };
        loop {
            self.migrate(current);
            let object = self.object_or_fatal(current)?;
            let next = match object.class() {
                ObjectClass::Proxy(proxy) => {
                    let proxy = *proxy;
                    return match self.proxy_trap(proxy, "has")? {
                        Some(trap) => Ok(self
                            .call(
                                &trap,
                                Value::Object(proxy.handler),
                                &[Value::Object(proxy.target), key_value(key)],
                            )?
                            .is_truthy()),
                        None => self.has_property(&Value::Object(proxy.target), key),
                    };
                }
                ObjectClass::Foreign(host) => return Ok(host.has_member(key)),
                ObjectClass::Array(elements)
                    if key.as_str() == Some("length")
                        || key.array_index().map_or(false, |i| elements.has(i)) =>
                {
                    return Ok(true)
                }
                _ if object.own_property(key).is_some() => return Ok(true),
                _ => object.prototype(),
            };
            match next {
                Some(proto) => current = proto,
                None => return Ok(false),
            }
        }
    }

    /// Whether `object` has `key` as an own property.
    pub(crate) fn has_own_property(&self, object: core_types::ObjectId, key: &PropertyKey) -> bool {
        let Some(object) = self.realm.heap.get(object) else {
            return false;
        };
        match object.class() {
            ObjectClass::Foreign(host) => host.has_member(key),
            ObjectClass::Array(elements)
                if key.as_str() == Some("length")
                    || key.array_index().map_or(false, |i| elements.has(i)) =>
            {
                true
            }
            _ => object.own_property(key).is_some(),
        }
    }

    /// Define or redefine an own property (`definePropertyTransition`).
    ///
    /// Array index keys write the element storage; their attributes are
    /// ignored.
    pub fn define_property(
        &mut self,
        object: core_types::ObjectId,
        key: PropertyKey,
        value: SlotValue,
        flags: PropertyFlags,
    ) -> Eval<()> {
        self.migrate(object);
        let target = self.object_or_fatal(object)?;
        match target.class() {
            ObjectClass::Proxy(proxy) => {
                let proxy = *proxy;
                if proxy.revoked {
                    return Err(self.revoked("defineProperty"));
                }
                return self.define_property(proxy.target, key, value, flags);
            }
            ObjectClass::Foreign(_) => {
                let data = value.as_data().cloned().unwrap_or_default();
                return match self.foreign_write(object, &key, data) {
                    true => Ok(()),
                    false => Err(self.type_error(format!("Cannot redefine property: {}", key))),
                };
            }
            ObjectClass::Array(_) if key.array_index().is_some() => {
                let index = key.array_index().unwrap_or_default();
                let data = value.as_data().cloned().unwrap_or_default();
                return match self.write_element(object, index, data) {
                    Written::Done => Ok(()),
                    _ => Err(self.type_error(format!(
                        "Cannot define property {}, object is not extensible",
                        key
                    ))),
                };
            }
            ObjectClass::Array(_) if key.as_str() == Some("length") => {
                let data = value.as_data().cloned().unwrap_or_default();
                return self.set_array_length(object, data);
            }
            _ => {}
        }
        let flags = match value {
            SlotValue::Accessor { .. } => flags | PropertyFlags::ACCESSOR,
            SlotValue::Data(_) => flags.difference(PropertyFlags::ACCESSOR),
        };
        let kind_change = target.own_property(&key).map_or(false, |(old_flags, _)| {
            old_flags.contains(PropertyFlags::ACCESSOR) != flags.contains(PropertyFlags::ACCESSOR)
        });
        let old_shape = Arc::clone(target.shape());
        match target.own_property(&key) {
            Some((old_flags, old_value)) if !old_flags.contains(PropertyFlags::CONFIGURABLE) => {
                if old_flags != flags || (!old_flags.is_writable() && *old_value != value) {
                    return Err(self.type_error(format!("Cannot redefine property: {}", key)));
                }
            }
            Some(_) => {}
            None if !target.is_extensible() => {
                return Err(self.type_error(format!(
                    "Cannot define property {}, object is not extensible",
                    key
                )))
            }
            None => {}
        }
        self.realm.heap[object].define_own(&self.realm.shapes, key, value, flags);
        if kind_change {
            // Data to accessor (or back) on a prototype.
            self.invalidate_prototype_shape(object, &old_shape);
        }
        Ok(())
    }

    fn foreign_write(&mut self, object: core_types::ObjectId, key: &PropertyKey, value: Value) -> bool {
        match self.realm.heap.get_mut(object).map(|o| o.class_mut()) {
            Some(ObjectClass::Foreign(host)) => host.write_member(key, value),
            _ => false,
        }
    }

    /// `delete object[key]`. Returns false when the property cannot be
    /// deleted; strict callers turn that into a TypeError.
    pub fn delete_property(&mut self, object: &Value, key: &PropertyKey) -> Eval<bool> {
        let id = match object {
            Value::Object(id) => *id,
            Value::Undefined | Value::Null => {
                return Err(self.type_error("Cannot convert undefined or null to object"))
            }
            Value::String(s) => {
                let own = key.as_str() == Some("length")
                    || key.array_index().map_or(false, |i| (i as usize) < utf16_len(s));
                return Ok(!own);
            }
            _ => return Ok(true),
        };
        self.migrate(id);
        let target = self.object_or_fatal(id)?;
        match target.class() {
            ObjectClass::Proxy(proxy) => {
                let proxy = *proxy;
                return match self.proxy_trap(proxy, "deleteProperty")? {
                    Some(trap) => Ok(self
                        .call(
                            &trap,
                            Value::Object(proxy.handler),
                            &[Value::Object(proxy.target), key_value(key)],
                        )?
                        .is_truthy()),
                    None => self.delete_property(&Value::Object(proxy.target), key),
                };
            }
            ObjectClass::Foreign(host) => return Ok(!host.has_member(key)),
            ObjectClass::Array(_) if key.as_str() == Some("length") => return Ok(false),
            ObjectClass::Array(elements) if key.array_index().map_or(false, |i| elements.has(i)) => {
                let index = key.array_index().unwrap_or_default();
                if let Some(elements) = self.realm.heap[id].elements_mut() {
                    elements.delete(index);
                }
                return Ok(true);
            }
            _ => {}
        }
        match target.own_property(key) {
            None => Ok(true),
            Some((flags, _)) if !flags.contains(PropertyFlags::CONFIGURABLE) => Ok(false),
            Some(_) => {
                let old_shape = Arc::clone(target.shape());
                self.realm.heap[id].remove_own(&self.realm.shapes, key);
                self.invalidate_prototype_shape(id, &old_shape);
                Ok(true)
            }
        }
    }

    /// `o.p` through the site's inline cache.
    pub(crate) fn cached_get(&mut self, receiver: &Value, key: &PropertyKey, cache: &GetCache) -> Eval<Value> {
        match cache.probe(&self.realm.heap, receiver) {
            GetAction::Value(value) => Ok(value),
            GetAction::CallGetter(getter) => self.call(&Value::Object(getter), receiver.clone(), &[]),
            GetAction::Proxy(id) | GetAction::Foreign(id) => self.get_from(id, key, receiver),
            GetAction::Generic => self.get_property(receiver, key),
            GetAction::Miss => {
                let value = self.get_property(receiver, key)?;
                let proto = self.realm.primitive_prototype(receiver);
                if let Some(entry) = GetEntry::specialize(&self.realm.heap, receiver, key, proto) {
                    cache.insert(entry, self.config.property_cache_limit);
                }
                Ok(value)
            }
        }
    }

    /// `o.p = v` through the site's inline cache.
    pub(crate) fn cached_set(
        &mut self,
        receiver: &Value,
        key: &PropertyKey,
        value: Value,
        cache: &SetCache,
    ) -> Eval<()> {
        match cache.probe(&mut self.realm.heap, receiver, &value) {
            SetAction::Done => Ok(()),
            SetAction::CallSetter(setter) => {
                self.call(&Value::Object(setter), receiver.clone(), &[value])?;
                Ok(())
            }
            SetAction::ReadOnly => {
                let failure = match receiver.as_object().and_then(|id| self.realm.heap.get(id)) {
                    Some(object) if !object.is_extensible() && object.own_property(key).is_none() => {
                        Written::NotExtensible
                    }
                    _ => Written::ReadOnly,
                };
                self.write_failed(receiver, key, failure)
            }
            SetAction::ArrayLength(array) => self.set_array_length(array, value),
            SetAction::Proxy(_) | SetAction::Foreign(_) | SetAction::Generic => {
                self.set_property(receiver, key.clone(), value)
            }
            SetAction::Miss => {
                let entry = SetEntry::specialize(&self.realm.heap, &self.realm.shapes, receiver, key);
                self.set_property(receiver, key.clone(), value)?;
                if let Some(entry) = entry {
                    cache.insert(entry, self.config.property_cache_limit);
                }
                Ok(())
            }
        }
    }

    /// `k in o` through the site's inline cache.
    pub(crate) fn cached_has(&mut self, object: &Value, key: &PropertyKey, cache: &HasCache) -> Eval<bool> {
        match cache.probe(&self.realm.heap, object) {
            HasAction::Answer(answer) => Ok(answer),
            HasAction::Proxy(_) | HasAction::Foreign(_) | HasAction::Generic => {
                self.has_property(object, key)
            }
            HasAction::Miss => {
                let answer = self.has_property(object, key)?;
                if let Some(entry) = HasEntry::specialize(&self.realm.heap, object, key) {
                    cache.insert(entry, self.config.property_cache_limit);
                }
                Ok(answer)
            }
        }
    }

    /// `o[k]` with an evaluated key.
    pub(crate) fn get_element(&mut self, receiver: &Value, key: &Value) -> Eval<Value> {
        if let (Value::Object(id), Value::Smi(index)) = (receiver, key) {
            if *index >= 0 {
                if let Some(value) = self.realm.heap.get(*id).and_then(|o| o.element(*index as u32)) {
                    return Ok(value.clone());
                }
            }
        }
        if receiver.is_nullish() {
            let key = self.to_primitive(key, Hint::String)?;
            return Err(self.type_error(format!(
                "Cannot read properties of {} (reading '{}')",
                receiver, key
            )));
        }
        let key = self.to_property_key(key)?;
        self.get_property(receiver, &key)
    }

    /// `o[k] = v` with an evaluated key.
    pub(crate) fn set_element(&mut self, receiver: &Value, key: &Value, value: Value) -> Eval<()> {
        if let (Value::Object(id), Value::Smi(index)) = (receiver, key) {
            if *index >= 0 {
                if let Some(slot) = self
                    .realm
                    .heap
                    .get_mut(*id)
                    .and_then(|o| o.elements_mut())
                    .and_then(|elements| elements.get_mut(*index as u32))
                {
                    *slot = value;
                    return Ok(());
                }
            }
        }
        let key = self.to_property_key(key)?;
        self.set_property(receiver, key, value)
    }
}
