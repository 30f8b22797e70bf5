use std::marker::PhantomData;

/// GPU buffer holding one `T`, labelled after the type.
///
/// Writes are dropped when the bytes match what was last uploaded, so
/// per-frame updates of a still camera cost nothing.
pub struct UniformBuffer<T> {
    buffer: wgpu::Buffer,
    uploaded: Option<Vec<u8>>,
    _content: PhantomData<T>,
}

impl<T: bytemuck::Pod> UniformBuffer<T> {
    pub fn new(device: &wgpu::Device) -> Self {
        let type_name = std::any::type_name::<T>();
        let short_name = type_name.rsplit("::").next().unwrap_or(type_name);
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&format!("{} Uniform", short_name)),
            size: std::mem::size_of::<T>() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Self {
            buffer,
            uploaded: None,
            _content: PhantomData,
        }
    }

    pub fn update_content(&mut self, queue: &wgpu::Queue, content: T) {
        let bytes = bytemuck::bytes_of(&content);
        if self.uploaded.as_deref() == Some(bytes) {
            return;
        }
        queue.write_buffer(&self.buffer, 0, bytes);
        self.uploaded = Some(bytes.to_vec());
    }

    pub fn binding_resource(&self) -> wgpu::BindingResource {
        self.buffer.as_entire_binding()
    }
}
