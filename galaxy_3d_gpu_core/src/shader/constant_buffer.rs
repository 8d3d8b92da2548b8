/// CPU-side staging for one constant buffer
///
/// Starts from the reflected default values, takes named writes, then
/// uploads the whole block into a native buffer in one copy.

use bytemuck::Pod;
use crate::engine_error;
use crate::error::{Error, Result};
use crate::native::NativeBuffer;
use crate::shader::{BoundResourceDescriptor, ConstantBufferLayout};

#[derive(Debug)]
pub struct ConstantBufferData {
    name: String,
    layout: ConstantBufferLayout,
    bytes: Vec<u8>,
}

impl ConstantBufferData {
    /// Staging block for `layout`, pre-filled with default values
    ///
    /// Fails with `InvalidResource` if a variable does not fit inside the
    /// buffer or its default value is not exactly the variable size.
    pub fn new(name: impl Into<String>, layout: ConstantBufferLayout) -> Result<Self> {
        let name = name.into();
        let mut bytes = vec![0u8; layout.size as usize];
        for variable in &layout.variables {
            let start = variable.offset as usize;
            let end = start + variable.size as usize;
            if end > bytes.len() {
                return Err(invalid(format!(
                    "Variable '{}.{}' at offset {} (size {}) exceeds buffer size {}",
                    name, variable.name, variable.offset, variable.size, layout.size
                )));
            }
            if let Some(default) = &variable.default_value {
                if default.len() != variable.size as usize {
                    return Err(invalid(format!(
                        "Default value of '{}.{}' is {} bytes, variable is {}",
                        name, variable.name, default.len(), variable.size
                    )));
                }
                bytes[start..end].copy_from_slice(default);
            }
        }
        Ok(Self {
            name,
            layout,
            bytes,
        })
    }

    /// Staging block for a reflected constant buffer
    ///
    /// Fails with `InvalidResource` if the descriptor is not a constant buffer
    /// or its reflected layout is inconsistent.
    pub fn from_descriptor(descriptor: &BoundResourceDescriptor) -> Result<Self> {
        match &descriptor.constant_buffer {
            Some(layout) => Self::new(descriptor.name.clone(), layout.clone()),
            None => Err(invalid(format!(
                "'{}' is not a constant buffer", descriptor.name
            ))),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn layout(&self) -> &ConstantBufferLayout {
        &self.layout
    }

    /// Size in bytes
    pub fn size(&self) -> u32 {
        self.layout.size
    }

    /// Write a typed value into the named variable
    ///
    /// # Arguments
    ///
    /// * `variable` - Variable name as reflected
    /// * `value` - Value whose byte size must equal the variable size
    pub fn set<T: Pod>(&mut self, variable: &str, value: &T) -> Result<()> {
        self.set_bytes(variable, bytemuck::bytes_of(value))
    }

    /// Write raw bytes into the named variable
    pub fn set_bytes(&mut self, variable: &str, data: &[u8]) -> Result<()> {
        let var = self.layout.variable(variable).ok_or_else(|| invalid(format!(
            "Constant buffer '{}' has no variable '{}'", self.name, variable
        )))?;
        if data.len() as u32 != var.size {
            return Err(invalid(format!(
                "Data size {} doesn't match size {} of '{}.{}'",
                data.len(), var.size, self.name, variable
            )));
        }
        let start = var.offset as usize;
        if start + data.len() > self.bytes.len() {
            return Err(invalid(format!(
                "Variable '{}.{}' at offset {} exceeds buffer size {}",
                self.name, variable, var.offset, self.layout.size
            )));
        }
        self.bytes[start..start + data.len()].copy_from_slice(data);
        Ok(())
    }

    /// Current bytes of the named variable
    pub fn get_bytes(&self, variable: &str) -> Option<&[u8]> {
        let var = self.layout.variable(variable)?;
        let start = var.offset as usize;
        self.bytes.get(start..start + var.size as usize)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Copy the staged block to the start of `buffer`
    pub fn upload(&self, buffer: &dyn NativeBuffer) -> Result<()> {
        if buffer.size() < self.bytes.len() as u64 {
            return Err(invalid(format!(
                "Buffer of {} bytes is too small for constant buffer '{}' ({} bytes)",
                buffer.size(), self.name, self.bytes.len()
            )));
        }
        buffer.update(0, &self.bytes)
    }
}

fn invalid(message: String) -> Error {
    engine_error!("galaxy3d::ConstantBufferData", "{}", message);
    Error::InvalidResource(message)
}

#[cfg(test)]
#[path = "constant_buffer_tests.rs"]
mod tests;
