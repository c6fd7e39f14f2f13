//! Modules, functions, blocks and value tables.

use crate::{
    BlockId, ExternId, FuncId, GlobalId, Inst, IrType, StructId, StructType, Terminator, ValueId,
};

/// What a value is.
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum ValueKind {
    /// The `n`th function parameter.
    Param(u32),
    /// Integer constant, stored zero-extended and masked to its width.
    ConstInt(u64),
    /// Float constant as `f64` bits (also for `f32` constants).
    ConstFloat(u64),
    ConstNull,
    /// Address of a private global.
    Global(GlobalId),
    /// Result of an instruction in `block`.
    Inst(BlockId),
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub struct ValueData {
    pub ty: IrType,
    pub kind: ValueKind,
    /// Name hint for printing; empty for anonymous values.
    pub name: String,
}

#[derive(Clone, Eq, PartialEq, Debug, Default)]
pub struct Block {
    pub name: String,
    pub insts: Vec<Inst>,
    pub terminator: Option<Terminator>,
}

/// A function: declared signature plus (once lowered) a body.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Function {
    pub name: String,
    pub params: Vec<IrType>,
    pub ret: IrType,
    pub values: Vec<ValueData>,
    pub blocks: Vec<Block>,
}

impl Function {
    fn new(name: String, params: Vec<IrType>, ret: IrType) -> Self {
        let values = params
            .iter()
            .enumerate()
            .map(|(i, ty)| ValueData {
                ty: *ty,
                kind: ValueKind::Param(u32::try_from(i).unwrap_or(u32::MAX)),
                name: String::new(),
            })
            .collect();
        Function {
            name,
            params,
            ret,
            values,
            blocks: Vec::new(),
        }
    }

    /// Value of the `index`th parameter. Parameters occupy the first value slots.
    #[inline]
    pub fn param(&self, index: usize) -> ValueId {
        debug_assert!(index < self.params.len(), "parameter {index} out of range");
        ValueId::from_index(index)
    }

    #[inline]
    pub fn value(&self, id: ValueId) -> &ValueData {
        &self.values[id.index()]
    }

    #[inline]
    pub fn block(&self, id: BlockId) -> &Block {
        &self.blocks[id.index()]
    }

    /// A function without blocks is only declared.
    pub fn is_declaration(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn block_ids(&self) -> impl Iterator<Item = BlockId> {
        (0..self.blocks.len()).map(BlockId::from_index)
    }

    /// Distinct predecessors of every block, indexed by block.
    pub fn predecessors(&self) -> Vec<Vec<BlockId>> {
        let mut preds: Vec<Vec<BlockId>> = vec![Vec::new(); self.blocks.len()];
        for (index, block) in self.blocks.iter().enumerate() {
            let from = BlockId::from_index(index);
            if let Some(term) = &block.terminator {
                for succ in term.successors() {
                    if let Some(list) = preds.get_mut(succ.index()) {
                        if !list.contains(&from) {
                            list.push(from);
                        }
                    }
                }
            }
        }
        preds
    }

    /// Iterate every instruction of every block.
    pub fn insts(&self) -> impl Iterator<Item = &Inst> {
        self.blocks.iter().flat_map(|b| b.insts.iter())
    }
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub struct ExternDecl {
    pub name: String,
    pub params: Vec<IrType>,
    pub ret: IrType,
}

/// Private constant byte string (NUL-terminated by the module).
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Global {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// A compilation unit.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Module {
    pub name: String,
    pub pointer_bits: u32,
    pub structs: Vec<StructType>,
    pub globals: Vec<Global>,
    pub externs: Vec<ExternDecl>,
    pub functions: Vec<Function>,
}

impl Module {
    pub fn new(name: impl Into<String>, pointer_bits: u32) -> Self {
        Module {
            name: name.into(),
            pointer_bits,
            structs: Vec::new(),
            globals: Vec::new(),
            externs: Vec::new(),
            functions: Vec::new(),
        }
    }

    /// Integer type as wide as a pointer.
    pub fn ptr_int_type(&self) -> IrType {
        IrType::int(self.pointer_bits).unwrap_or(IrType::I64)
    }

    // Structs

    /// Register a named struct type with no fields yet.
    ///
    /// Fields are set later with [`set_struct_body`](Self::set_struct_body)
    /// so aggregates may refer to each other.
    pub fn declare_struct(&mut self, name: impl Into<String>) -> StructId {
        let id = StructId::from_index(self.structs.len());
        self.structs.push(StructType {
            name: name.into(),
            fields: Vec::new(),
        });
        id
    }

    pub fn set_struct_body(&mut self, id: StructId, fields: Vec<IrType>) {
        self.structs[id.index()].fields = fields;
    }

    pub fn struct_type(&self, id: StructId) -> &StructType {
        &self.structs[id.index()]
    }

    // Layout

    pub fn size_of(&self, ty: IrType) -> u64 {
        match ty {
            IrType::I1 | IrType::I8 => 1,
            IrType::I16 => 2,
            IrType::I32 | IrType::F32 => 4,
            IrType::I64 | IrType::F64 => 8,
            IrType::Ptr => u64::from(self.pointer_bits / 8),
            IrType::Void => 0,
            IrType::Struct(id) => {
                let (size, align) = self.struct_size_align(id);
                round_up(size, align)
            }
        }
    }

    pub fn align_of(&self, ty: IrType) -> u64 {
        match ty {
            IrType::Struct(id) => self.struct_size_align(id).1,
            other => self.size_of(other).max(1),
        }
    }

    /// Byte offset of `field` within struct `id`.
    pub fn field_offset(&self, id: StructId, field: u32) -> u64 {
        let mut offset = 0;
        for (index, ty) in self.structs[id.index()].fields.iter().enumerate() {
            offset = round_up(offset, self.align_of(*ty));
            if index == field as usize {
                return offset;
            }
            offset += self.size_of(*ty);
        }
        offset
    }

    fn struct_size_align(&self, id: StructId) -> (u64, u64) {
        let mut offset = 0;
        let mut align = 1;
        for ty in &self.structs[id.index()].fields {
            let field_align = self.align_of(*ty);
            align = align.max(field_align);
            offset = round_up(offset, field_align) + self.size_of(*ty);
        }
        (offset, align)
    }

    // Globals

    /// Add a private NUL-terminated string constant.
    pub fn add_string(&mut self, text: &str) -> GlobalId {
        let id = GlobalId::from_index(self.globals.len());
        let mut bytes = text.as_bytes().to_vec();
        bytes.push(0);
        self.globals.push(Global {
            name: format!(".str.{}", id.raw()),
            bytes,
        });
        id
    }

    // Functions

    /// Declare a function signature. The body is filled in by an [`IrBuilder`](crate::IrBuilder).
    pub fn declare_function(
        &mut self,
        name: impl Into<String>,
        params: Vec<IrType>,
        ret: IrType,
    ) -> FuncId {
        let id = FuncId::from_index(self.functions.len());
        self.functions.push(Function::new(name.into(), params, ret));
        id
    }

    pub fn function(&self, id: FuncId) -> &Function {
        &self.functions[id.index()]
    }

    pub fn function_mut(&mut self, id: FuncId) -> &mut Function {
        &mut self.functions[id.index()]
    }

    pub fn function_by_name(&self, name: &str) -> Option<FuncId> {
        self.functions
            .iter()
            .position(|f| f.name == name)
            .map(FuncId::from_index)
    }

    /// Look up or add an external declaration.
    pub fn get_or_declare_extern(&mut self, name: &str, params: &[IrType], ret: IrType) -> ExternId {
        if let Some(index) = self.externs.iter().position(|e| e.name == name) {
            debug_assert_eq!(self.externs[index].params, params, "extern `{name}` redeclared");
            return ExternId::from_index(index);
        }
        let id = ExternId::from_index(self.externs.len());
        self.externs.push(ExternDecl {
            name: name.to_owned(),
            params: params.to_vec(),
            ret,
        });
        id
    }

    pub fn extern_decl(&self, id: ExternId) -> &ExternDecl {
        &self.externs[id.index()]
    }
}

#[inline]
fn round_up(value: u64, align: u64) -> u64 {
    value.div_ceil(align) * align
}
