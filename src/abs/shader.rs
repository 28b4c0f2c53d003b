//! OpenGL shader loading and compilation.
//!
//! Shaders live in a single text file: a line containing the `#shader`
//! marker selects the section named on it (`vertex` or `fragment`) and
//! every other line is routed into the selected section. [`ShaderSource`]
//! performs that split, [`Shader`] compiles one stage and
//! [`ShaderProgram`] links the stages and resolves uniforms through a
//! per-program location cache.

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use glam::{Mat4, Vec3, Vec4};
use glow::HasContext;

/// Vertex and fragment sources split out of a single shader file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShaderSource {
    pub vertex: String,
    pub fragment: String,
}

#[derive(Clone, Copy)]
enum Section {
    None,
    Vertex,
    Fragment,
}

impl ShaderSource {
    /// Splits the tagged single-file format.
    ///
    /// Marker lines never appear in the output; every content line keeps
    /// its order and gains a trailing newline. Content before the first
    /// marker has no section to go to and is dropped.
    pub fn parse(text: &str) -> Self {
        let mut source = ShaderSource::default();
        let mut section = Section::None;
        for line in text.lines() {
            if line.contains("#shader") {
                if line.contains("vertex") {
                    section = Section::Vertex;
                } else if line.contains("fragment") {
                    section = Section::Fragment;
                }
            } else {
                let buffer = match section {
                    Section::None => continue,
                    Section::Vertex => &mut source.vertex,
                    Section::Fragment => &mut source.fragment,
                };
                buffer.push_str(line);
                buffer.push('\n');
            }
        }
        source
    }
}

/// An individual compiled shader stage.
pub struct Shader {
    gl: Arc<glow::Context>,
    id: glow::Shader,
}

impl Shader {
    /// Compiles a stage from source code.
    ///
    /// On failure the stage object is deleted and the driver's info log
    /// is returned.
    pub fn new(gl: &Arc<glow::Context>, stage: u32, source: &str) -> Result<Self, String> {
        unsafe {
            let shader = gl.create_shader(stage).map_err(|e| e.to_string())?;
            gl.shader_source(shader, source);
            gl.compile_shader(shader);

            if !gl.get_shader_compile_status(shader) {
                let log = gl.get_shader_info_log(shader);
                gl.delete_shader(shader);
                return Err(log);
            }

            Ok(Self {
                gl: Arc::clone(gl),
                id: shader,
            })
        }
    }
}

impl Drop for Shader {
    fn drop(&mut self) {
        unsafe {
            self.gl.delete_shader(self.id);
        }
    }
}

/// Lazily resolved uniform locations, keyed by name.
///
/// The driver is queried exactly once per name; a missing uniform is
/// cached as `None` so later lookups stay silent and cheap.
pub struct UniformCache<L> {
    locations: HashMap<String, Option<L>>,
}

impl<L: Clone> UniformCache<L> {
    pub fn new() -> Self {
        UniformCache {
            locations: HashMap::new(),
        }
    }

    /// Returns the location for `name`, calling `query` on the first
    /// lookup only.
    pub fn get_or_resolve(
        &mut self,
        name: &str,
        query: impl FnOnce(&str) -> Option<L>,
    ) -> Option<L> {
        if let Some(cached) = self.locations.get(name) {
            return cached.clone();
        }
        let location = query(name);
        if location.is_none() {
            log::warn!("uniform '{}' doesn't exist", name);
        }
        self.locations.insert(name.to_string(), location.clone());
        location
    }
}

/// A value that can be written to a resolved uniform location.
pub trait Uniform {
    fn set(&self, gl: &glow::Context, location: &glow::UniformLocation);
}

impl Uniform for f32 {
    fn set(&self, gl: &glow::Context, location: &glow::UniformLocation) {
        unsafe {
            gl.uniform_1_f32(Some(location), *self);
        }
    }
}

impl Uniform for i32 {
    fn set(&self, gl: &glow::Context, location: &glow::UniformLocation) {
        unsafe {
            gl.uniform_1_i32(Some(location), *self);
        }
    }
}

impl Uniform for Vec3 {
    fn set(&self, gl: &glow::Context, location: &glow::UniformLocation) {
        unsafe {
            gl.uniform_3_f32(Some(location), self.x, self.y, self.z);
        }
    }
}

impl Uniform for Vec4 {
    fn set(&self, gl: &glow::Context, location: &glow::UniformLocation) {
        unsafe {
            gl.uniform_4_f32(Some(location), self.x, self.y, self.z, self.w);
        }
    }
}

impl Uniform for Mat4 {
    fn set(&self, gl: &glow::Context, location: &glow::UniformLocation) {
        unsafe {
            gl.uniform_matrix_4_f32_slice(Some(location), false, self.as_ref());
        }
    }
}

impl<T: Uniform> Uniform for &T {
    fn set(&self, gl: &glow::Context, location: &glow::UniformLocation) {
        (*self).set(gl, location);
    }
}

/// A linked shader program with lazily cached uniform locations.
pub struct ShaderProgram {
    gl: Arc<glow::Context>,
    id: glow::Program,
    uniforms: RefCell<UniformCache<glow::UniformLocation>>,
}

impl ShaderProgram {
    /// Loads, splits, compiles and links the single-file shader at `path`.
    ///
    /// A stage that fails to compile is logged and left out of the
    /// program. Link failures are logged but not escalated either, so the
    /// caller always gets a program handle and rendering carries on with
    /// whatever the driver produced.
    pub fn from_file(gl: &Arc<glow::Context>, path: impl AsRef<Path>) -> Result<Self, String> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
        let source = ShaderSource::parse(&text);

        let mut shaders = Vec::new();
        for (stage, name, src) in [
            (glow::VERTEX_SHADER, "vertex", &source.vertex),
            (glow::FRAGMENT_SHADER, "fragment", &source.fragment),
        ] {
            match Shader::new(gl, stage, src) {
                Ok(shader) => shaders.push(shader),
                Err(log) => log::error!(
                    "failed to compile {} shader in {}: {}",
                    name,
                    path.display(),
                    log
                ),
            }
        }

        Self::new(gl, &shaders)
    }

    /// Links a program from the given stages and detaches them afterwards.
    pub fn new(gl: &Arc<glow::Context>, shaders: &[Shader]) -> Result<Self, String> {
        unsafe {
            let program = gl.create_program().map_err(|e| e.to_string())?;

            for shader in shaders {
                gl.attach_shader(program, shader.id);
            }

            gl.link_program(program);
            if !gl.get_program_link_status(program) {
                log::error!(
                    "shader program link failed: {}",
                    gl.get_program_info_log(program)
                );
            }

            for shader in shaders {
                gl.detach_shader(program, shader.id);
            }

            Ok(Self {
                gl: Arc::clone(gl),
                id: program,
                uniforms: RefCell::new(UniformCache::new()),
            })
        }
    }

    /// Binds the program for drawing.
    pub fn use_program(&self) {
        unsafe {
            self.gl.use_program(Some(self.id));
        }
    }

    /// Unbinds whatever program is current.
    pub fn clear_program(gl: &glow::Context) {
        unsafe {
            gl.use_program(None);
        }
    }

    /// Sets a uniform by name.
    ///
    /// An unknown name is warned about on its first use and the call is a
    /// no-op from then on.
    pub fn set_uniform<T: Uniform>(&self, name: &str, value: T) {
        let location = self
            .uniforms
            .borrow_mut()
            .get_or_resolve(name, |n| unsafe { self.gl.get_uniform_location(self.id, n) });
        if let Some(location) = location {
            value.set(&self.gl, &location);
        }
    }
}

impl Drop for ShaderProgram {
    fn drop(&mut self) {
        unsafe {
            self.gl.delete_program(self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    #[test]
    fn test_source_split() {
        let text = "#shader vertex\n\
                    #version 330 core\n\
                    in vec3 a_position;\n\
                    void main() { gl_Position = vec4(a_position, 1.0); }\n\
                    #shader fragment\n\
                    out vec4 frag_color;\n\
                    void main() { frag_color = vec4(1.0); }\n";
        let source = ShaderSource::parse(text);
        assert_eq!(
            source.vertex,
            "#version 330 core\n\
             in vec3 a_position;\n\
             void main() { gl_Position = vec4(a_position, 1.0); }\n"
        );
        assert_eq!(
            source.fragment,
            "out vec4 frag_color;\n\
             void main() { frag_color = vec4(1.0); }\n"
        );
    }

    #[test]
    fn test_source_split_drops_unmarked_prefix() {
        let source = ShaderSource::parse("stray line\n#shader fragment\nvoid main() {}\n");
        assert_eq!(source.vertex, "");
        assert_eq!(source.fragment, "void main() {}\n");
    }

    #[test]
    fn test_uniform_cache_queries_once() {
        let mut cache = UniformCache::new();
        let queries = Cell::new(0);

        let first = cache.get_or_resolve("u_view", |_| {
            queries.set(queries.get() + 1);
            Some(7)
        });
        let second = cache.get_or_resolve("u_view", |_| {
            queries.set(queries.get() + 1);
            Some(99)
        });

        assert_eq!(first, Some(7));
        assert_eq!(second, Some(7));
        assert_eq!(queries.get(), 1);
    }

    #[test]
    fn test_uniform_cache_keeps_missing_sentinel() {
        let mut cache = UniformCache::<i32>::new();
        let queries = Cell::new(0);

        for _ in 0..3 {
            let location = cache.get_or_resolve("u_missing", |_| {
                queries.set(queries.get() + 1);
                None
            });
            assert_eq!(location, None);
        }

        assert_eq!(queries.get(), 1);
    }
}
