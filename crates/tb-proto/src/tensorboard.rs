//! Event-file message types (`tensorboard.Event` and friends)

/// One record of a TensorBoard event file
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Event {
    /// Fractional seconds since the Unix epoch
    #[prost(double, tag = "1")]
    pub wall_time: f64,

    /// Global step of the producing training job
    #[prost(int64, tag = "2")]
    pub step: i64,

    #[prost(oneof = "event::What", tags = "3, 4, 5")]
    pub what: ::core::option::Option<event::What>,
}

pub mod event {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum What {
        /// `brain.Event:2` header written at file creation
        #[prost(string, tag = "3")]
        FileVersion(::prost::alloc::string::String),

        /// Serialized `GraphDef`
        #[prost(bytes, tag = "4")]
        GraphDef(::prost::alloc::vec::Vec<u8>),

        #[prost(message, tag = "5")]
        Summary(super::Summary),
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Summary {
    #[prost(message, repeated, tag = "1")]
    pub value: ::prost::alloc::vec::Vec<summary::Value>,
}

pub mod summary {
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Value {
        #[prost(string, tag = "1")]
        pub tag: ::prost::alloc::string::String,

        /// Present on the first value of each tag; later values inherit it
        #[prost(message, optional, tag = "9")]
        pub metadata: ::core::option::Option<super::SummaryMetadata>,

        #[prost(oneof = "value::Value", tags = "2, 4, 8")]
        pub value: ::core::option::Option<value::Value>,
    }

    pub mod value {
        #[derive(Clone, PartialEq, ::prost::Oneof)]
        pub enum Value {
            /// Pre-2.0 scalar shape, migrated to the scalars plugin
            #[prost(float, tag = "2")]
            SimpleValue(f32),

            #[prost(message, tag = "4")]
            Image(super::Image),

            #[prost(message, tag = "8")]
            Tensor(super::super::TensorProto),
        }
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Image {
        #[prost(int32, tag = "1")]
        pub height: i32,

        #[prost(int32, tag = "2")]
        pub width: i32,

        #[prost(int32, tag = "3")]
        pub colorspace: i32,

        #[prost(bytes, tag = "4")]
        pub encoded_image_string: ::prost::alloc::vec::Vec<u8>,
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SummaryMetadata {
    #[prost(message, optional, tag = "1")]
    pub plugin_data: ::core::option::Option<summary_metadata::PluginData>,

    #[prost(string, tag = "2")]
    pub display_name: ::prost::alloc::string::String,

    #[prost(string, tag = "3")]
    pub summary_description: ::prost::alloc::string::String,

    #[prost(enumeration = "DataClass", tag = "4")]
    pub data_class: i32,
}

pub mod summary_metadata {
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct PluginData {
        #[prost(string, tag = "1")]
        pub plugin_name: ::prost::alloc::string::String,

        /// Opaque plugin payload, forwarded verbatim to the service
        #[prost(bytes, tag = "2")]
        pub content: ::prost::alloc::vec::Vec<u8>,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum DataClass {
    Unknown = 0,
    Scalar = 1,
    Tensor = 2,
    BlobSequence = 3,
}

/// Minimal tensor payload: enough to round-trip histogram, text and
/// hparams summaries without interpreting them
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TensorProto {
    #[prost(int32, tag = "1")]
    pub dtype: i32,

    #[prost(bytes, tag = "4")]
    pub tensor_content: ::prost::alloc::vec::Vec<u8>,

    #[prost(double, repeated, tag = "6")]
    pub double_val: ::prost::alloc::vec::Vec<f64>,

    #[prost(float, repeated, tag = "5")]
    pub float_val: ::prost::alloc::vec::Vec<f32>,

    #[prost(bytes, repeated, tag = "8")]
    pub string_val: ::prost::alloc::vec::Vec<::prost::alloc::vec::Vec<u8>>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GraphDef {
    #[prost(message, repeated, tag = "1")]
    pub node: ::prost::alloc::vec::Vec<NodeDef>,

    #[prost(int32, tag = "3")]
    pub version: i32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct NodeDef {
    #[prost(string, tag = "1")]
    pub name: ::prost::alloc::string::String,

    #[prost(string, tag = "2")]
    pub op: ::prost::alloc::string::String,

    #[prost(string, repeated, tag = "3")]
    pub input: ::prost::alloc::vec::Vec<::prost::alloc::string::String>,

    #[prost(string, tag = "4")]
    pub device: ::prost::alloc::string::String,

    #[prost(map = "string, message", tag = "5")]
    pub attr: ::std::collections::HashMap<::prost::alloc::string::String, AttrValue>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AttrValue {
    #[prost(oneof = "attr_value::Value", tags = "1, 2, 3, 4, 5, 8")]
    pub value: ::core::option::Option<attr_value::Value>,
}

pub mod attr_value {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Value {
        #[prost(message, tag = "1")]
        List(ListValue),

        #[prost(bytes, tag = "2")]
        S(::prost::alloc::vec::Vec<u8>),

        #[prost(int64, tag = "3")]
        I(i64),

        #[prost(float, tag = "4")]
        F(f32),

        #[prost(bool, tag = "5")]
        B(bool),

        #[prost(message, tag = "8")]
        Tensor(super::TensorProto),
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct ListValue {
        #[prost(bytes, repeated, tag = "2")]
        pub s: ::prost::alloc::vec::Vec<::prost::alloc::vec::Vec<u8>>,

        #[prost(int64, repeated, tag = "3")]
        pub i: ::prost::alloc::vec::Vec<i64>,

        #[prost(float, repeated, tag = "4")]
        pub f: ::prost::alloc::vec::Vec<f32>,

        #[prost(bool, repeated, tag = "5")]
        pub b: ::prost::alloc::vec::Vec<bool>,
    }
}
