use std::marker::PhantomData;

#[derive(Debug, Clone)]
pub struct IdGenerator<T: From<usize>> {
    next_id: usize,
    phantom: PhantomData<T>,
}

impl<T: From<usize>> IdGenerator<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gen(&mut self) -> T {
        let id = self.next_id;
        self.next_id += 1;
        T::from(id)
    }
}

impl<T: From<usize>> Default for IdGenerator<T> {
    fn default() -> IdGenerator<T> {
        IdGenerator {
            next_id: 0,
            phantom: PhantomData,
        }
    }
}

/// Issues `prefix0`, `prefix1`, ... within one compilation.
#[derive(Debug, Clone, Default)]
pub struct NameGenerator {
    prefix: &'static str,
    id: IdGenerator<usize>,
}

impl NameGenerator {
    pub fn new(prefix: &'static str) -> Self {
        NameGenerator {
            prefix,
            id: IdGenerator::new(),
        }
    }

    pub fn gen(&mut self) -> String {
        format!("{}{}", self.prefix, self.id.gen())
    }
}
